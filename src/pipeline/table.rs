//! In-memory table of encounter rows used for fitting and evaluation

use super::{FeatureLookup, PipelineError};
use crate::types::record::FeatureValue;

/// Value type of a column, inferred from its contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Row-major table with optional (missing) cells
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<FeatureValue>>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Option<FeatureValue>>) -> Result<(), PipelineError> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::RowWidth {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Push a row of raw text cells. Empty cells are missing values.
    ///
    /// Cells keep their text exactly as written (trimmed); whether a column
    /// is numeric is decided per column by [`Table::column_kind`].
    pub fn push_text_row<'a, I>(&mut self, cells: I) -> Result<(), PipelineError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let row = cells
            .into_iter()
            .map(|cell| {
                if cell.trim().is_empty() {
                    None
                } else {
                    Some(FeatureValue::category(cell.trim()))
                }
            })
            .collect();
        self.push_row(row)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// A column is numeric when every present cell reads as a number.
    ///
    /// A column with no present cells counts as numeric.
    pub fn column_kind(&self, index: usize) -> ColumnKind {
        let all_numeric = self
            .rows
            .iter()
            .filter_map(|row| row[index].as_ref())
            .all(|value| value.as_f64().is_some());
        if all_numeric {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }

    /// Present values of a column
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &FeatureValue> {
        self.rows.iter().filter_map(move |row| row[index].as_ref())
    }

    pub fn row(&self, index: usize) -> TableRow<'_> {
        TableRow { table: self, index }
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = TableRow<'_>> {
        (0..self.rows.len()).map(move |index| self.row(index))
    }

    /// New table holding the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Remove a column, returning the remaining table and the removed cells
    pub fn take_column(&self, name: &str) -> Result<(Table, Vec<Option<FeatureValue>>), PipelineError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| PipelineError::UnknownColumn(name.to_string()))?;

        let mut columns = self.columns.clone();
        columns.remove(index);

        let mut taken = Vec::with_capacity(self.rows.len());
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                taken.push(row.remove(index));
                row
            })
            .collect();

        Ok((Table { columns, rows }, taken))
    }
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> TableRow<'a> {
    pub fn get(&self, column: usize) -> Option<&'a FeatureValue> {
        self.table.rows[self.index][column].as_ref()
    }
}

impl FeatureLookup for TableRow<'_> {
    fn feature(&self, name: &str) -> Result<Option<FeatureValue>, PipelineError> {
        let column = self
            .table
            .column_index(name)
            .ok_or_else(|| PipelineError::MissingFeature(name.to_string()))?;
        Ok(self.get(column).cloned())
    }
}

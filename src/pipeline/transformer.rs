//! Column transformer: median imputation for numeric columns, most-frequent
//! imputation plus one-hot encoding for categorical columns.
//!
//! Output layout is the numeric block followed by the one-hot block, in the
//! order the features appear in the expected feature set.

use super::table::{ColumnKind, Table};
use super::{ExpectedFeatureSet, FeatureLookup, PipelineError};
use crate::types::record::FeatureValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder category used when a categorical column has no observed values
const MISSING_CATEGORY: &str = "missing";

/// Fitted median imputer for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub feature: String,
    pub median: f64,
}

/// Fitted imputer + one-hot encoder for one categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub feature: String,
    pub most_frequent: String,
    /// Sorted, unique categories seen during fit
    pub categories: Vec<String>,
}

impl CategoricalColumn {
    fn position(&self, label: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
    }
}

/// One transformed row: dense numeric block plus active one-hot positions.
///
/// One-hot positions are absolute indices into the full output vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    pub numeric: Vec<f64>,
    pub active: Vec<usize>,
}

impl EncodedRow {
    /// Dot product against a weight vector of `output_width` length
    pub fn dot(&self, weights: &[f64]) -> f64 {
        let numeric: f64 = self
            .numeric
            .iter()
            .zip(weights)
            .map(|(x, w)| x * w)
            .sum();
        numeric + self.active.iter().map(|&i| weights[i]).sum::<f64>()
    }

    pub fn to_dense(&self, width: usize) -> Vec<f64> {
        let mut dense = vec![0.0; width];
        dense[..self.numeric.len()].copy_from_slice(&self.numeric);
        for &i in &self.active {
            dense[i] = 1.0;
        }
        dense
    }
}

/// Fitted column transformer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
}

impl ColumnTransformer {
    /// Fit imputers and encoders on the given table.
    ///
    /// Every expected feature must be a column of the table; columns are
    /// routed by their inferred value type.
    pub fn fit(table: &Table, features: &ExpectedFeatureSet) -> Result<Self, PipelineError> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for feature in features.iter() {
            let index = table
                .column_index(feature)
                .ok_or_else(|| PipelineError::UnknownColumn(feature.to_string()))?;

            match table.column_kind(index) {
                ColumnKind::Numeric => {
                    let values: Vec<f64> = table
                        .column_values(index)
                        .filter_map(FeatureValue::as_f64)
                        .filter(|v| !v.is_nan())
                        .collect();
                    numeric.push(NumericColumn {
                        feature: feature.to_string(),
                        median: median(values),
                    });
                }
                ColumnKind::Categorical => {
                    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                    for value in table.column_values(index) {
                        *counts.entry(value.to_string()).or_insert(0) += 1;
                    }
                    categorical.push(CategoricalColumn {
                        feature: feature.to_string(),
                        most_frequent: most_frequent(&counts),
                        categories: counts.into_keys().collect(),
                    });
                }
            }
        }

        Ok(Self {
            numeric,
            categorical,
        })
    }

    /// Width of the transformed feature vector
    pub fn output_width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    pub fn numeric_columns(&self) -> &[NumericColumn] {
        &self.numeric
    }

    pub fn categorical_columns(&self) -> &[CategoricalColumn] {
        &self.categorical
    }

    /// Names of the transformed outputs, e.g. `num__age` or `cat__race_Asian`
    pub fn output_feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .numeric
            .iter()
            .map(|c| format!("num__{}", c.feature))
            .collect();
        for column in &self.categorical {
            names.extend(
                column
                    .categories
                    .iter()
                    .map(|category| format!("cat__{}_{}", column.feature, category)),
            );
        }
        names
    }

    /// Transform one input row
    pub fn transform<L: FeatureLookup + ?Sized>(&self, row: &L) -> Result<EncodedRow, PipelineError> {
        let mut numeric = Vec::with_capacity(self.numeric.len());
        for column in &self.numeric {
            let value = match row.feature(&column.feature)? {
                None => column.median,
                Some(value) => match value.as_f64() {
                    Some(v) if v.is_nan() => column.median,
                    Some(v) => v,
                    None => {
                        return Err(PipelineError::TypeMismatch {
                            feature: column.feature.clone(),
                            value: value.to_string(),
                        })
                    }
                },
            };
            numeric.push(value);
        }

        let mut active = Vec::with_capacity(self.categorical.len());
        let mut offset = self.numeric.len();
        for column in &self.categorical {
            let label = match row.feature(&column.feature)? {
                Some(value) => value.to_string(),
                None => column.most_frequent.clone(),
            };
            // Unknown categories encode as all zeros
            if let Some(position) = column.position(&label) {
                active.push(offset + position);
            }
            offset += column.categories.len();
        }

        Ok(EncodedRow { numeric, active })
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Most frequent category; ties go to the lexicographically smallest
fn most_frequent(counts: &BTreeMap<String, usize>) -> String {
    let mut best: Option<(&String, usize)> = None;
    for (category, &count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((category, count));
        }
    }
    best.map(|(category, _)| category.clone())
        .unwrap_or_else(|| MISSING_CATEGORY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::tests::sample_fields;
    use crate::types::record::PatientRecord;

    fn training_table() -> Table {
        let mut table = Table::new(vec![
            "race".to_string(),
            "num_medications".to_string(),
            "metformin".to_string(),
        ]);
        table.push_text_row(["Caucasian", "10", "No"]).unwrap();
        table.push_text_row(["AfricanAmerican", "20", "Steady"]).unwrap();
        table.push_text_row(["Caucasian", "", "No"]).unwrap();
        table.push_text_row(["", "30", "Up"]).unwrap();
        table
    }

    fn features() -> ExpectedFeatureSet {
        ExpectedFeatureSet::new(["race", "num_medications", "metformin"]).unwrap()
    }

    #[test]
    fn test_fit_partitions_by_type() {
        let transformer = ColumnTransformer::fit(&training_table(), &features()).unwrap();

        assert_eq!(transformer.numeric_columns().len(), 1);
        assert_eq!(transformer.numeric_columns()[0].median, 20.0);
        assert_eq!(transformer.categorical_columns().len(), 2);
        assert_eq!(transformer.categorical_columns()[0].most_frequent, "Caucasian");
        // 1 numeric + 2 race categories + 3 metformin categories
        assert_eq!(transformer.output_width(), 6);
        assert_eq!(
            transformer.output_feature_names(),
            vec![
                "num__num_medications",
                "cat__race_AfricanAmerican",
                "cat__race_Caucasian",
                "cat__metformin_No",
                "cat__metformin_Steady",
                "cat__metformin_Up",
            ]
        );
    }

    #[test]
    fn test_transform_imputes_missing_cells() {
        let table = training_table();
        let transformer = ColumnTransformer::fit(&table, &features()).unwrap();

        // Row 2 has no num_medications, row 3 has no race
        let encoded = transformer.transform(&table.row(2)).unwrap();
        assert_eq!(encoded.to_dense(6), vec![20.0, 0.0, 1.0, 1.0, 0.0, 0.0]);

        let encoded = transformer.transform(&table.row(3)).unwrap();
        assert_eq!(encoded.to_dense(6), vec![30.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_category_is_all_zero() {
        let transformer = ColumnTransformer::fit(&training_table(), &features()).unwrap();
        let record = PatientRecord::new(sample_fields())
            .with_extra("metformin", FeatureValue::Integer(0));

        // race "Caucasian" is known, metformin "0" is not
        let encoded = transformer.transform(&record).unwrap();
        assert_eq!(encoded.numeric, vec![16.0]);
        assert_eq!(encoded.active, vec![2]);
    }

    #[test]
    fn test_diagnosis_codes_keep_their_spelling() {
        let mut table = Table::new(vec!["diag_1".to_string()]);
        for code in ["038", "38", "250.1", "250.10", "V57"] {
            table.push_text_row([code]).unwrap();
        }
        let set = ExpectedFeatureSet::new(["diag_1"]).unwrap();
        let transformer = ColumnTransformer::fit(&table, &set).unwrap();

        assert_eq!(
            transformer.categorical_columns()[0].categories,
            vec!["038", "250.1", "250.10", "38", "V57"]
        );
        assert_eq!(transformer.transform(&table.row(0)).unwrap().active, vec![0]);
        assert_eq!(transformer.transform(&table.row(3)).unwrap().active, vec![2]);
    }

    #[test]
    fn test_category_in_numeric_column_is_type_mismatch() {
        let mut table = Table::new(vec!["A1Cresult".to_string()]);
        table.push_text_row(["7"]).unwrap();
        let set = ExpectedFeatureSet::new(["A1Cresult"]).unwrap();
        let transformer = ColumnTransformer::fit(&table, &set).unwrap();

        let mut bad = Table::new(vec!["A1Cresult".to_string()]);
        bad.push_text_row([">8"]).unwrap();
        let err = transformer.transform(&bad.row(0)).unwrap_err();
        assert!(matches!(err, PipelineError::TypeMismatch { .. }));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let transformer = ColumnTransformer::fit(&training_table(), &features()).unwrap();
        let record = PatientRecord::new(sample_fields());
        assert_eq!(
            transformer.transform(&record),
            Err(PipelineError::MissingFeature("metformin".to_string()))
        );
    }

    #[test]
    fn test_dot_matches_dense() {
        let row = EncodedRow {
            numeric: vec![2.0, 3.0],
            active: vec![3],
        };
        let weights = [1.0, 0.5, 9.0, 4.0];
        assert_eq!(row.dot(&weights), 2.0 + 1.5 + 4.0);
        assert_eq!(row.to_dense(4), vec![2.0, 3.0, 0.0, 1.0]);
    }
}

//! Cleaned encounter CSV loading

use crate::pipeline::{PipelineError, Table};
use crate::types::record::FeatureValue;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Load the cleaned encounter dataset
pub fn load_clean_data<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open dataset {:?}", path))?;
    let table = read_table(file).with_context(|| format!("Failed to read dataset {:?}", path))?;

    info!(
        path = %path.display(),
        rows = table.n_rows(),
        columns = table.n_columns(),
        "Data loaded successfully"
    );
    Ok(table)
}

/// Parse CSV with a header row into a table. Empty cells are missing values.
pub fn read_table<R: Read>(reader: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();
    let mut table = Table::new(columns);

    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", line + 1))?;
        table
            .push_text_row(record.iter())
            .with_context(|| format!("Bad CSV record {}", line + 1))?;
    }
    Ok(table)
}

/// Separate the binary target column from the features
pub fn split_target(table: &Table, target: &str) -> Result<(Table, Vec<u8>), PipelineError> {
    let (features, cells) = table.take_column(target)?;
    let labels = cells
        .into_iter()
        .map(|cell| match cell.as_ref().and_then(FeatureValue::as_f64) {
            Some(v) if v == 0.0 => Ok(0),
            Some(v) if v == 1.0 => Ok(1),
            _ => Err(PipelineError::InvalidLabel(
                cell.map(|value| value.to_string()).unwrap_or_default(),
            )),
        })
        .collect::<Result<Vec<u8>, _>>()?;
    Ok((features, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "age,time_in_hospital,insulin,readmit_30\n\
                       [60-70),4,Steady,0\n\
                       [70-80),,Up,1\n\
                       [50-60),2,No,0\n";

    #[test]
    fn test_read_table() {
        let table = read_table(CSV.as_bytes()).unwrap();
        assert_eq!(table.columns(), ["age", "time_in_hospital", "insulin", "readmit_30"]);
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.row(1).get(1), None);
        assert_eq!(table.row(0).get(1), Some(&FeatureValue::category("4")));
    }

    #[test]
    fn test_split_target() {
        let table = read_table(CSV.as_bytes()).unwrap();
        let (features, labels) = split_target(&table, "readmit_30").unwrap();
        assert_eq!(labels, vec![0, 1, 0]);
        assert_eq!(features.columns(), ["age", "time_in_hospital", "insulin"]);
    }

    #[test]
    fn test_split_target_accepts_float_labels() {
        let table = read_table("x,readmit_30\n1,1.0\n2,0.0\n".as_bytes()).unwrap();
        let (_, labels) = split_target(&table, "readmit_30").unwrap();
        assert_eq!(labels, vec![1, 0]);
    }

    #[test]
    fn test_split_target_rejects_bad_labels() {
        let table = read_table("x,readmit_30\n1,2\n".as_bytes()).unwrap();
        assert_eq!(
            split_target(&table, "readmit_30"),
            Err(PipelineError::InvalidLabel("2".to_string()))
        );
        assert!(matches!(
            split_target(&table, "readmitted"),
            Err(PipelineError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_ragged_csv_fails() {
        assert!(read_table("a,b\n1,2,3\n".as_bytes()).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, CSV).unwrap();
        assert_eq!(load_clean_data(&path).unwrap().n_rows(), 3);
        assert!(load_clean_data(dir.path().join("absent.csv")).is_err());
    }
}

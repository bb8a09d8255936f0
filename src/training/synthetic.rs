//! Synthetic cleaned-encounter data for exercising the trainer and server
//! without the real dataset.

use crate::collector::{
    ADMISSION_SOURCE_IDS, ADMISSION_TYPE_IDS, AGE_BRACKETS, DISCHARGE_DISPOSITION_IDS,
    INSULIN_OPTIONS,
};
use crate::reconcile::THERAPY_FEATURES;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Every column of the cleaned dataset, target last
pub fn dataset_columns() -> Vec<&'static str> {
    let mut columns = vec![
        "race",
        "gender",
        "age",
        "admission_type_id",
        "discharge_disposition_id",
        "admission_source_id",
        "time_in_hospital",
        "num_lab_procedures",
        "num_procedures",
        "num_medications",
        "number_outpatient",
        "number_emergency",
        "number_inpatient",
        "diag_1",
        "diag_2",
        "diag_3",
        "number_diagnoses",
        "max_glu_serum",
        "A1Cresult",
    ];
    columns.extend(THERAPY_FEATURES);
    columns.extend(["insulin", "change", "diabetesMed", "readmit_30"]);
    columns
}

const RACES: [&str; 6] = ["Caucasian", "Caucasian", "Caucasian", "AfricanAmerican", "Hispanic", "?"];
const DIAGNOSES: [&str; 8] = ["250", "250.02", "428", "414", "786", "410", "486", "V57"];
const GLU_SERUM: [&str; 4] = ["None", "None", "Norm", ">200"];
const A1C: [&str; 4] = ["None", ">7", "Norm", ">8"];
const DOSE: [&str; 4] = ["No", "Steady", "Up", "Down"];

/// Seeded generator of plausible encounter rows
pub struct EncounterGenerator {
    rng: StdRng,
    /// Probability that any single diagnosis cell is left empty
    missing_rate: f64,
}

impl EncounterGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            missing_rate: 0.02,
        }
    }

    /// One row of text cells matching [`dataset_columns`]
    pub fn next_row(&mut self) -> Vec<String> {
        let age_index = self.rng.gen_range(3..AGE_BRACKETS.len());
        let time_in_hospital: i64 = self.rng.gen_range(1..=14);
        let number_inpatient: i64 = if self.rng.gen_bool(0.3) {
            self.rng.gen_range(1..=6)
        } else {
            0
        };
        let number_emergency: i64 = if self.rng.gen_bool(0.15) {
            self.rng.gen_range(1..=4)
        } else {
            0
        };
        let num_medications: i64 = self.rng.gen_range(3..=40);
        let insulin = self.choose(&INSULIN_OPTIONS);
        let discharge = self.choose_id(&DISCHARGE_DISPOSITION_IDS);

        // Hidden risk score driving the label
        let mut score = -2.6
            + 0.55 * number_inpatient as f64
            + 0.25 * number_emergency as f64
            + 0.06 * time_in_hospital as f64
            + 0.12 * (age_index as f64 - 6.0);
        if insulin == "Up" || insulin == "Down" {
            score += 0.4;
        }
        if discharge != 1 {
            score += 0.3;
        }
        let readmitted = self.rng.gen_bool(1.0 / (1.0 + (-score).exp()));

        let mut row = vec![
            self.choose(&RACES).to_string(),
            self.choose(&["Female", "Female", "Male"]).to_string(),
            AGE_BRACKETS[age_index].to_string(),
            self.choose_id(&ADMISSION_TYPE_IDS).to_string(),
            discharge.to_string(),
            self.choose_id(&ADMISSION_SOURCE_IDS).to_string(),
            time_in_hospital.to_string(),
            self.rng.gen_range(1..=100).to_string(),
            self.rng.gen_range(0..=6).to_string(),
            num_medications.to_string(),
            if self.rng.gen_bool(0.2) { self.rng.gen_range(1..=5) } else { 0 }.to_string(),
            number_emergency.to_string(),
            number_inpatient.to_string(),
        ];
        for _ in 0..3 {
            let diagnosis = self.choose(&DIAGNOSES);
            row.push(if self.rng.gen_bool(self.missing_rate) {
                String::new()
            } else {
                diagnosis.to_string()
            });
        }
        row.push(self.rng.gen_range(1..=16).to_string());
        row.push(self.choose(&GLU_SERUM).to_string());
        row.push(self.choose(&A1C).to_string());

        let mut any_change = insulin == "Up" || insulin == "Down";
        for column in THERAPY_FEATURES {
            let common = matches!(column, "metformin" | "glipizide" | "glyburide" | "pioglitazone");
            let dose = if common && self.rng.gen_bool(0.25) {
                self.choose(&DOSE)
            } else {
                "No"
            };
            any_change |= dose == "Up" || dose == "Down";
            row.push(dose.to_string());
        }
        row.push(insulin.to_string());

        row.push(if any_change { "Ch" } else { "No" }.to_string());
        let on_medication = insulin != "No" || row.iter().any(|cell| cell == "Steady");
        row.push(if on_medication { "Yes" } else { "No" }.to_string());
        row.push(u8::from(readmitted).to_string());
        row
    }

    fn choose<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }

    fn choose_id(&mut self, choices: &[i64]) -> i64 {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

/// Write `rows` synthetic encounters as CSV
pub fn write_csv<W: Write>(writer: W, rows: usize, seed: u64) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record(dataset_columns())
        .context("Failed to write CSV header")?;

    let mut generator = EncounterGenerator::new(seed);
    for _ in 0..rows {
        writer
            .write_record(generator.next_row())
            .context("Failed to write CSV record")?;
    }
    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Write a synthetic dataset file, creating the parent directory if needed
pub fn write_csv_file<P: AsRef<Path>>(path: P, rows: usize, seed: u64) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_csv(file, rows, seed)
}

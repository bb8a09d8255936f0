//! Input collection: the patient form and its conversion into a record.
//!
//! The option lists and numeric bounds here are the same ones the form page
//! renders, so a browser submission always passes. Requests built by hand are
//! held to the same limits.

use crate::types::record::{EncounterFields, PatientRecord};
use serde::{Deserialize, Serialize};

/// Diagnosis code used for the three diagnosis columns the form does not collect
pub const DIAGNOSIS_PLACEHOLDER: &str = "250";

pub const AGE_BRACKETS: [&str; 10] = [
    "[0-10)", "[10-20)", "[20-30)", "[30-40)", "[40-50)", "[50-60)", "[60-70)", "[70-80)",
    "[80-90)", "[90-100)",
];

pub const GENDERS: [&str; 3] = ["Female", "Male", "Unknown/Invalid"];

pub const RACES: [&str; 6] = ["Caucasian", "AfricanAmerican", "Hispanic", "Asian", "Other", "?"];

/// 1=Emergency, 2=Urgent, 3=Elective, ...
pub const ADMISSION_TYPE_IDS: [i64; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

pub const DISCHARGE_DISPOSITION_IDS: [i64; 20] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 18, 19, 20, 21, 22, 23, 24, 25, 28,
];

pub const ADMISSION_SOURCE_IDS: [i64; 20] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 14, 17, 20, 21, 22, 23, 24, 25,
];

pub const INSULIN_OPTIONS: [&str; 4] = ["No", "Steady", "Up", "Down"];

pub const YES_NO: [&str; 2] = ["No", "Yes"];

/// Inclusive bounds and default for a numeric count input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountBounds {
    pub field: &'static str,
    pub label: &'static str,
    pub min: i64,
    pub max: i64,
    pub default: i64,
}

pub const TIME_IN_HOSPITAL: CountBounds = CountBounds {
    field: "time_in_hospital",
    label: "Time in hospital (days)",
    min: 1,
    max: 14,
    default: 4,
};

pub const NUMBER_DIAGNOSES: CountBounds = CountBounds {
    field: "number_diagnoses",
    label: "Number of diagnoses",
    min: 1,
    max: 16,
    default: 6,
};

pub const NUM_LAB_PROCEDURES: CountBounds = CountBounds {
    field: "num_lab_procedures",
    label: "Number of lab procedures",
    min: 0,
    max: 150,
    default: 44,
};

pub const NUM_MEDICATIONS: CountBounds = CountBounds {
    field: "num_medications",
    label: "Number of medications",
    min: 0,
    max: 100,
    default: 16,
};

pub const NUM_PROCEDURES: CountBounds = CountBounds {
    field: "num_procedures",
    label: "Number of procedures",
    min: 0,
    max: 6,
    default: 1,
};

pub const NUMBER_OUTPATIENT: CountBounds = CountBounds {
    field: "number_outpatient",
    label: "No. of outpatient visits",
    min: 0,
    max: 20,
    default: 0,
};

pub const NUMBER_EMERGENCY: CountBounds = CountBounds {
    field: "number_emergency",
    label: "No. of emergency visits",
    min: 0,
    max: 20,
    default: 0,
};

pub const NUMBER_INPATIENT: CountBounds = CountBounds {
    field: "number_inpatient",
    label: "No. of inpatient visits",
    min: 0,
    max: 20,
    default: 0,
};

/// Form input that falls outside the widget's allowed values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("{field}: {value:?} is not one of the allowed options")]
    UnknownOption { field: &'static str, value: String },
    #[error("{field}: {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Values submitted from the patient form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientForm {
    pub age: String,
    pub gender: String,
    pub race: String,
    pub time_in_hospital: i64,
    pub number_diagnoses: i64,
    pub admission_type_id: i64,
    pub discharge_disposition_id: i64,
    pub admission_source_id: i64,
    pub num_lab_procedures: i64,
    pub num_medications: i64,
    pub insulin: String,
    /// "Yes" or "No" as shown to the operator
    pub medication_change: String,
    #[serde(rename = "diabetesMed")]
    pub diabetes_med: String,
    pub num_procedures: i64,
    pub number_outpatient: i64,
    pub number_emergency: i64,
    pub number_inpatient: i64,
}

impl Default for PatientForm {
    fn default() -> Self {
        Self {
            age: AGE_BRACKETS[6].to_string(),
            gender: GENDERS[0].to_string(),
            race: RACES[0].to_string(),
            time_in_hospital: TIME_IN_HOSPITAL.default,
            number_diagnoses: NUMBER_DIAGNOSES.default,
            admission_type_id: ADMISSION_TYPE_IDS[0],
            discharge_disposition_id: DISCHARGE_DISPOSITION_IDS[0],
            admission_source_id: ADMISSION_SOURCE_IDS[0],
            num_lab_procedures: NUM_LAB_PROCEDURES.default,
            num_medications: NUM_MEDICATIONS.default,
            insulin: INSULIN_OPTIONS[0].to_string(),
            medication_change: YES_NO[0].to_string(),
            diabetes_med: YES_NO[0].to_string(),
            num_procedures: NUM_PROCEDURES.default,
            number_outpatient: NUMBER_OUTPATIENT.default,
            number_emergency: NUMBER_EMERGENCY.default,
            number_inpatient: NUMBER_INPATIENT.default,
        }
    }
}

impl PatientForm {
    /// Check the submission and build the patient record.
    ///
    /// A medication change is recorded as `Ch`, no change as `No`; the three
    /// diagnosis columns are fixed to [`DIAGNOSIS_PLACEHOLDER`].
    pub fn collect(&self) -> Result<PatientRecord, FormError> {
        let age = pick("age", &self.age, &AGE_BRACKETS)?;
        let gender = pick("gender", &self.gender, &GENDERS)?;
        let race = pick("race", &self.race, &RACES)?;
        let insulin = pick("insulin", &self.insulin, &INSULIN_OPTIONS)?;
        let change = pick("medication_change", &self.medication_change, &YES_NO)?;
        let diabetes_med = pick("diabetesMed", &self.diabetes_med, &YES_NO)?;

        let admission_type_id = pick_id("admission_type_id", self.admission_type_id, &ADMISSION_TYPE_IDS)?;
        let discharge_disposition_id = pick_id(
            "discharge_disposition_id",
            self.discharge_disposition_id,
            &DISCHARGE_DISPOSITION_IDS,
        )?;
        let admission_source_id =
            pick_id("admission_source_id", self.admission_source_id, &ADMISSION_SOURCE_IDS)?;

        let fields = EncounterFields {
            race: race.to_string(),
            gender: gender.to_string(),
            age: age.to_string(),
            admission_type_id,
            discharge_disposition_id,
            admission_source_id,
            time_in_hospital: bounded(TIME_IN_HOSPITAL, self.time_in_hospital)?,
            num_lab_procedures: bounded(NUM_LAB_PROCEDURES, self.num_lab_procedures)?,
            num_procedures: bounded(NUM_PROCEDURES, self.num_procedures)?,
            num_medications: bounded(NUM_MEDICATIONS, self.num_medications)?,
            number_outpatient: bounded(NUMBER_OUTPATIENT, self.number_outpatient)?,
            number_emergency: bounded(NUMBER_EMERGENCY, self.number_emergency)?,
            number_inpatient: bounded(NUMBER_INPATIENT, self.number_inpatient)?,
            number_diagnoses: bounded(NUMBER_DIAGNOSES, self.number_diagnoses)?,
            insulin: insulin.to_string(),
            change: if change == "Yes" { "Ch" } else { "No" }.to_string(),
            diabetes_med: diabetes_med.to_string(),
            diag_1: DIAGNOSIS_PLACEHOLDER.to_string(),
            diag_2: DIAGNOSIS_PLACEHOLDER.to_string(),
            diag_3: DIAGNOSIS_PLACEHOLDER.to_string(),
        };

        Ok(PatientRecord::new(fields))
    }
}

fn pick(field: &'static str, value: &str, options: &[&'static str]) -> Result<&'static str, FormError> {
    options
        .iter()
        .copied()
        .find(|option| *option == value)
        .ok_or_else(|| FormError::UnknownOption {
            field,
            value: value.to_string(),
        })
}

fn pick_id(field: &'static str, value: i64, options: &[i64]) -> Result<i64, FormError> {
    if options.contains(&value) {
        Ok(value)
    } else {
        Err(FormError::UnknownOption {
            field,
            value: value.to_string(),
        })
    }
}

fn bounded(bounds: CountBounds, value: i64) -> Result<i64, FormError> {
    if (bounds.min..=bounds.max).contains(&value) {
        Ok(value)
    } else {
        Err(FormError::OutOfRange {
            field: bounds.field,
            value,
            min: bounds.min,
            max: bounds.max,
        })
    }
}

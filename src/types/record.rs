//! Patient record data structures for readmission scoring

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single scalar feature value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Integer(i64),
    Float(f64),
    Category(String),
}

impl FeatureValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Integer(i) => Some(*i as f64),
            FeatureValue::Float(f) => Some(*f),
            FeatureValue::Category(s) => s.trim().parse::<f64>().ok(),
        }
    }

    pub fn category(value: impl Into<String>) -> Self {
        FeatureValue::Category(value.into())
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Integer(i) => write!(f, "{}", i),
            FeatureValue::Float(v) => write!(f, "{}", v),
            FeatureValue::Category(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Integer(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Category(value.to_string())
    }
}

/// The encounter fields known to the collection form.
///
/// Field names match the column names of the cleaned encounter dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterFields {
    pub race: String,
    pub gender: String,
    pub age: String,
    pub admission_type_id: i64,
    pub discharge_disposition_id: i64,
    pub admission_source_id: i64,
    pub time_in_hospital: i64,
    pub num_lab_procedures: i64,
    pub num_procedures: i64,
    pub num_medications: i64,
    pub number_outpatient: i64,
    pub number_emergency: i64,
    pub number_inpatient: i64,
    pub number_diagnoses: i64,
    pub insulin: String,
    pub change: String,
    #[serde(rename = "diabetesMed")]
    pub diabetes_med: String,
    pub diag_1: String,
    pub diag_2: String,
    pub diag_3: String,
}

impl EncounterFields {
    /// Column names of the known fields, in dataset order
    pub const NAMES: [&'static str; 20] = [
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
        "number_diagnoses",
        "insulin",
        "change",
        "diabetesMed",
        "diag_1",
        "diag_2",
        "diag_3",
    ];

    pub fn is_known(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }

    /// Look up a known field by its column name
    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        let value = match name {
            "race" => FeatureValue::category(&self.race),
            "gender" => FeatureValue::category(&self.gender),
            "age" => FeatureValue::category(&self.age),
            "admission_type_id" => self.admission_type_id.into(),
            "discharge_disposition_id" => self.discharge_disposition_id.into(),
            "admission_source_id" => self.admission_source_id.into(),
            "time_in_hospital" => self.time_in_hospital.into(),
            "num_lab_procedures" => self.num_lab_procedures.into(),
            "num_procedures" => self.num_procedures.into(),
            "num_medications" => self.num_medications.into(),
            "number_outpatient" => self.number_outpatient.into(),
            "number_emergency" => self.number_emergency.into(),
            "number_inpatient" => self.number_inpatient.into(),
            "number_diagnoses" => self.number_diagnoses.into(),
            "insulin" => FeatureValue::category(&self.insulin),
            "change" => FeatureValue::category(&self.change),
            "diabetesMed" => FeatureValue::category(&self.diabetes_med),
            "diag_1" => FeatureValue::category(&self.diag_1),
            "diag_2" => FeatureValue::category(&self.diag_2),
            "diag_3" => FeatureValue::category(&self.diag_3),
            _ => return None,
        };
        Some(value)
    }
}

/// A single patient encounter to be scored.
///
/// Known form fields are always present. Columns the form does not collect
/// live in the extension map, which only ever grows: an existing entry is
/// never replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(flatten)]
    fields: EncounterFields,
    #[serde(flatten)]
    extra: BTreeMap<String, FeatureValue>,
}

impl PatientRecord {
    pub fn new(fields: EncounterFields) -> Self {
        Self {
            fields,
            extra: BTreeMap::new(),
        }
    }

    /// Add an extension column, leaving any existing value untouched
    pub fn with_extra(mut self, name: impl Into<String>, value: FeatureValue) -> Self {
        self.insert_if_absent(name.into(), value);
        self
    }

    /// Insert an extension column unless the name is already present.
    ///
    /// Returns `true` if the value was inserted.
    pub(crate) fn insert_if_absent(&mut self, name: String, value: FeatureValue) -> bool {
        if self.contains(&name) {
            return false;
        }
        self.extra.insert(name, value);
        true
    }

    pub fn fields(&self) -> &EncounterFields {
        &self.fields
    }

    pub fn extras(&self) -> &BTreeMap<String, FeatureValue> {
        &self.extra
    }

    pub fn contains(&self, name: &str) -> bool {
        EncounterFields::is_known(name) || self.extra.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.fields
            .get(name)
            .or_else(|| self.extra.get(name).cloned())
    }

    /// All feature names carried by this record: known fields first, then extensions
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        EncounterFields::NAMES
            .iter()
            .copied()
            .chain(self.extra.keys().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        EncounterFields::NAMES.len() + self.extra.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_fields() -> EncounterFields {
        EncounterFields {
            race: "Caucasian".to_string(),
            gender: "Female".to_string(),
            age: "[60-70)".to_string(),
            admission_type_id: 1,
            discharge_disposition_id: 1,
            admission_source_id: 7,
            time_in_hospital: 4,
            num_lab_procedures: 44,
            num_procedures: 1,
            num_medications: 16,
            number_outpatient: 0,
            number_emergency: 0,
            number_inpatient: 0,
            number_diagnoses: 6,
            insulin: "Steady".to_string(),
            change: "Ch".to_string(),
            diabetes_med: "Yes".to_string(),
            diag_1: "250".to_string(),
            diag_2: "250".to_string(),
            diag_3: "250".to_string(),
        }
    }

    #[test]
    fn test_known_fields_lookup() {
        let record = PatientRecord::new(sample_fields());

        assert_eq!(record.get("age"), Some(FeatureValue::category("[60-70)")));
        assert_eq!(record.get("num_lab_procedures"), Some(FeatureValue::Integer(44)));
        assert_eq!(record.get("diabetesMed"), Some(FeatureValue::category("Yes")));
        assert_eq!(record.get("metformin"), None);
        assert_eq!(record.len(), 20);
    }

    #[test]
    fn test_extra_never_overwrites() {
        let record = PatientRecord::new(sample_fields())
            .with_extra("A1Cresult", FeatureValue::category(">8"))
            .with_extra("A1Cresult", FeatureValue::Integer(0))
            .with_extra("age", FeatureValue::Integer(0));

        assert_eq!(record.get("A1Cresult"), Some(FeatureValue::category(">8")));
        assert_eq!(record.get("age"), Some(FeatureValue::category("[60-70)")));
        assert_eq!(record.extras().len(), 1);
    }

    #[test]
    fn test_feature_value_numeric_view() {
        assert_eq!(FeatureValue::Integer(42).as_f64(), Some(42.0));
        assert_eq!(FeatureValue::category("250.83").as_f64(), Some(250.83));
        assert_eq!(FeatureValue::category("[70-80)").as_f64(), None);
        assert_eq!(FeatureValue::category("038").to_string(), "038");
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = PatientRecord::new(sample_fields())
            .with_extra("metformin", FeatureValue::category("No"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["diabetesMed"], "Yes");
        assert_eq!(json["metformin"], "No");
        assert_eq!(json["time_in_hospital"], 4);
    }
}

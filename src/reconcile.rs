//! Schema reconciliation between collected records and the pipeline's
//! expected feature set.
//!
//! The collection form gathers only a subset of the columns the pipeline was
//! fitted on. Every expected column the record lacks is backfilled with a
//! fixed default: therapy columns get the "not administered" category, all
//! other columns get numeric zero.

use crate::pipeline::ExpectedFeatureSet;
use crate::types::record::{FeatureValue, PatientRecord};
use tracing::debug;

/// Category meaning the therapy was not administered during the encounter
pub const NOT_ADMINISTERED: &str = "No";

/// Therapy columns of the cleaned encounter dataset, in file order.
///
/// Single agents first, then the combination columns. `insulin` is not a
/// therapy default: the form always collects it.
pub const THERAPY_FEATURES: [&str; 22] = [
    "metformin",
    "repaglinide",
    "nateglinide",
    "chlorpropamide",
    "glimepiride",
    "acetohexamide",
    "glipizide",
    "glyburide",
    "tolbutamide",
    "pioglitazone",
    "rosiglitazone",
    "acarbose",
    "miglitol",
    "troglitazone",
    "tolazamide",
    "examide",
    "citoglipton",
    "glyburide-metformin",
    "glipizide-metformin",
    "glimepiride-pioglitazone",
    "metformin-rosiglitazone",
    "metformin-pioglitazone",
];

/// True if the feature is one of the known therapy columns
pub fn is_therapy_feature(name: &str) -> bool {
    THERAPY_FEATURES.contains(&name)
}

/// Default value for an expected feature the record does not carry
pub fn default_for(name: &str) -> FeatureValue {
    if is_therapy_feature(name) {
        FeatureValue::category(NOT_ADMINISTERED)
    } else {
        FeatureValue::Integer(0)
    }
}

/// Backfill every expected feature missing from `record`.
///
/// Existing values are never replaced and fields outside `expected` pass
/// through unchanged, so the result's key set is a superset of `expected`.
pub fn reconcile(record: PatientRecord, expected: &ExpectedFeatureSet) -> PatientRecord {
    reconcile_with_report(record, expected).0
}

/// Like [`reconcile`], also returning the names that were backfilled
pub fn reconcile_with_report(
    mut record: PatientRecord,
    expected: &ExpectedFeatureSet,
) -> (PatientRecord, Vec<String>) {
    let mut backfilled = Vec::new();
    for name in expected.iter() {
        if record.insert_if_absent(name.to_string(), default_for(name)) {
            backfilled.push(name.to_string());
        }
    }

    if !backfilled.is_empty() {
        debug!(
            count = backfilled.len(),
            features = ?backfilled,
            "Backfilled missing expected features"
        );
    }

    (record, backfilled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::tests::sample_fields;
    use crate::types::record::EncounterFields;

    fn expected() -> ExpectedFeatureSet {
        let mut names: Vec<String> = EncounterFields::NAMES.iter().map(|s| s.to_string()).collect();
        names.extend(
            [
                "metformin",
                "glyburide-metformin",
                "metformin-rosiglitazone",
                "acetohexamide",
                "A1Cresult",
                "max_glu_serum",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        ExpectedFeatureSet::new(names).unwrap()
    }

    #[test]
    fn test_therapy_features_unique() {
        let mut names = THERAPY_FEATURES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), THERAPY_FEATURES.len());
    }

    #[test]
    fn test_therapy_classification() {
        assert!(is_therapy_feature("metformin"));
        assert!(is_therapy_feature("acetohexamide"));
        assert!(is_therapy_feature("glyburide-metformin"));
        assert!(is_therapy_feature("glimepiride-pioglitazone"));
        assert!(!is_therapy_feature("insulin"));
        assert!(!is_therapy_feature("A1Cresult"));
        assert!(!is_therapy_feature("metformin-"));
        assert!(!is_therapy_feature(""));
    }

    #[test]
    fn test_every_therapy_column_backfills_not_administered() {
        let expected = ExpectedFeatureSet::new(THERAPY_FEATURES).unwrap();
        let (out, backfilled) = reconcile_with_report(PatientRecord::new(sample_fields()), &expected);

        assert_eq!(backfilled.len(), THERAPY_FEATURES.len());
        for name in THERAPY_FEATURES {
            assert_eq!(out.get(name), Some(FeatureValue::category("No")), "{}", name);
        }
    }

    #[test]
    fn test_backfills_with_policy_defaults() {
        let record = PatientRecord::new(sample_fields());
        let (out, backfilled) = reconcile_with_report(record, &expected());

        assert_eq!(backfilled.len(), 6);
        assert_eq!(out.get("metformin"), Some(FeatureValue::category("No")));
        assert_eq!(out.get("glyburide-metformin"), Some(FeatureValue::category("No")));
        assert_eq!(out.get("metformin-rosiglitazone"), Some(FeatureValue::category("No")));
        assert_eq!(out.get("acetohexamide"), Some(FeatureValue::category("No")));
        assert_eq!(out.get("A1Cresult"), Some(FeatureValue::Integer(0)));
        assert_eq!(out.get("max_glu_serum"), Some(FeatureValue::Integer(0)));
    }

    #[test]
    fn test_output_covers_expected_and_keeps_values() {
        let record = PatientRecord::new(sample_fields())
            .with_extra("metformin", FeatureValue::category("Steady"))
            .with_extra("payer_code", FeatureValue::category("MC"));
        let original = record.clone();
        let expected = expected();

        let out = reconcile(record, &expected);

        assert!(expected.iter().all(|name| out.contains(name)));
        for name in original.feature_names() {
            assert_eq!(out.get(name), original.get(name), "{} changed", name);
        }
        // Pass-through column survives untouched
        assert_eq!(out.get("payer_code"), Some(FeatureValue::category("MC")));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let expected = expected();
        let once = reconcile(PatientRecord::new(sample_fields()), &expected);
        let twice = reconcile(once.clone(), &expected);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_complete_record_is_unchanged() {
        let expected = ExpectedFeatureSet::new(["age", "race", "insulin"]).unwrap();
        let record = PatientRecord::new(sample_fields());
        let (out, backfilled) = reconcile_with_report(record.clone(), &expected);

        assert!(backfilled.is_empty());
        assert_eq!(out, record);
    }
}

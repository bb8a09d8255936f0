//! Risk presentation: probability formatting and the displayed verdict

use crate::types::prediction::{PredictionResult, RiskTier};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Shown beneath every result
pub const DISCLAIMER: &str =
    "Note: Model outputs probabilities based on historical data; always apply clinical judgment.";

/// Probability as a percentage with two decimals, e.g. `0.62` -> `"62.00%"`
pub fn format_probability(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// Everything the operator sees for one prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionView {
    pub request_id: String,
    pub probability: f64,
    /// Percentage text, e.g. `62.00%`
    pub probability_display: String,
    pub predicted_label: u8,
    pub risk_tier: RiskTier,
    /// Tier banner, e.g. `HIGH RISK`
    pub risk_label: String,
    /// `Predicted probability of readmission within 30 days: 62.00%`
    pub summary: String,
    pub disclaimer: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&PredictionResult> for PredictionView {
    fn from(result: &PredictionResult) -> Self {
        let probability_display = format_probability(result.probability);
        Self {
            request_id: result.request_id.clone(),
            probability: result.probability,
            summary: format!(
                "Predicted probability of readmission within 30 days: {}",
                probability_display
            ),
            probability_display,
            predicted_label: result.predicted_label,
            risk_tier: result.risk_tier,
            risk_label: result.risk_tier.label().to_string(),
            disclaimer: DISCLAIMER.to_string(),
            timestamp: result.timestamp,
        }
    }
}

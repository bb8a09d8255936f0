//! Prediction result and risk tier structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Readmission risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Determine the tier from a class-1 probability and thresholds.
    ///
    /// Each boundary belongs to the upper tier.
    pub fn from_probability(probability: f64, thresholds: &RiskTierThresholds) -> Self {
        if probability >= thresholds.high {
            RiskTier::High
        } else if probability >= thresholds.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }

    /// Human-facing label shown on the result page
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW RISK",
            RiskTier::Medium => "MEDIUM RISK",
            RiskTier::High => "HIGH RISK",
        }
    }

    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability cut points between tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskTierThresholds {
    /// Lowest probability classified MEDIUM
    pub medium: f64,
    /// Lowest probability classified HIGH
    pub high: f64,
}

impl RiskTierThresholds {
    /// Check that 0 <= medium <= high <= 1
    pub fn validate(&self) -> Result<(), String> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(self.medium) || !in_range(self.high) {
            return Err(format!(
                "risk thresholds must lie in [0, 1] (medium={}, high={})",
                self.medium, self.high
            ));
        }
        if self.medium > self.high {
            return Err(format!(
                "medium threshold {} exceeds high threshold {}",
                self.medium, self.high
            ));
        }
        Ok(())
    }
}

impl Default for RiskTierThresholds {
    fn default() -> Self {
        Self {
            medium: 0.25,
            high: 0.50,
        }
    }
}

/// Classify a probability using the standard thresholds
pub fn classify_tier(probability: f64) -> RiskTier {
    RiskTier::from_probability(probability, &RiskTierThresholds::default())
}

/// Outcome of scoring one patient record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Identifier used to correlate log lines for this request
    pub request_id: String,

    /// Probability of 30-day readmission (0.0 - 1.0)
    pub probability: f64,

    /// Predicted class label (1 = readmitted within 30 days)
    pub predicted_label: u8,

    /// Risk tier derived from the probability
    pub risk_tier: RiskTier,

    /// Prediction timestamp
    pub timestamp: DateTime<Utc>,
}

impl PredictionResult {
    pub fn new(probability: f64, predicted_label: u8, thresholds: &RiskTierThresholds) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            probability,
            predicted_label,
            risk_tier: RiskTier::from_probability(probability, thresholds),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(classify_tier(0.49), RiskTier::Medium);
        assert_eq!(classify_tier(0.50), RiskTier::High);
        assert_eq!(classify_tier(0.24999), RiskTier::Low);
        assert_eq!(classify_tier(0.25), RiskTier::Medium);
        assert_eq!(classify_tier(0.0), RiskTier::Low);
        assert_eq!(classify_tier(1.0), RiskTier::High);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = RiskTierThresholds {
            medium: 0.1,
            high: 0.9,
        };
        assert_eq!(RiskTier::from_probability(0.5, &thresholds), RiskTier::Medium);
        assert_eq!(RiskTier::from_probability(0.05, &thresholds), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(0.9, &thresholds), RiskTier::High);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(RiskTierThresholds::default().validate().is_ok());
        assert!(RiskTierThresholds { medium: 0.6, high: 0.5 }.validate().is_err());
        assert!(RiskTierThresholds { medium: -0.1, high: 0.5 }.validate().is_err());
        assert!(RiskTierThresholds { medium: 0.3, high: 1.2 }.validate().is_err());
    }

    #[test]
    fn test_prediction_result_serialization() {
        let result = PredictionResult::new(0.62, 1, &RiskTierThresholds::default());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["risk_tier"], "HIGH");
        assert_eq!(json["predicted_label"], 1);

        let back: PredictionResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.request_id, result.request_id);
        assert_eq!(back.risk_tier, RiskTier::High);
    }
}

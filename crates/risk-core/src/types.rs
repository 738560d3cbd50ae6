//! Prediction output types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{LOW_RISK_UPPER, MEDIUM_RISK_UPPER};

/// Risk bucket derived from the default probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    /// `p < 0.2`
    #[serde(rename = "Low Risk")]
    Low,
    /// `0.2 <= p < 0.4`
    #[serde(rename = "Medium Risk")]
    Medium,
    /// `p >= 0.4`
    #[serde(rename = "High Risk")]
    High,
}

impl RiskCategory {
    /// Bucket a default probability
    ///
    /// Lower bounds are inclusive. Anything that is not below a band's upper
    /// bound (NaN included) falls into the next band up.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability < LOW_RISK_UPPER {
            RiskCategory::Low
        } else if probability < MEDIUM_RISK_UPPER {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        }
    }

    /// Human readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            RiskCategory::Low => "Low Risk",
            RiskCategory::Medium => "Medium Risk",
            RiskCategory::High => "High Risk",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scored row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Probability of default (class 1)
    pub default_probability: f64,
    /// Bucket for `default_probability`
    pub risk_category: RiskCategory,
}

impl PredictionResult {
    /// Build a result from a probability
    #[must_use]
    pub fn from_probability(default_probability: f64) -> Self {
        Self {
            default_probability,
            risk_category: RiskCategory::from_probability(default_probability),
        }
    }
}

//! Weight-of-evidence encoding for categorical fields.
//!
//! The encoder is fitted offline. For each level it stores
//!
//! ```text
//! woe = ln( ((pos + r) / (P + 2r)) / ((neg + r) / (N + 2r)) )
//! ```
//!
//! where `pos`/`neg` are the level's default/non-default counts, `P`/`N` the
//! totals and `r` the regularization pseudo-count. Unseen and missing levels
//! map to a per-column fallback, `0.0` (no evidence either way) by default.

use std::collections::{BTreeMap, HashMap};

use risk_core::constants::DEFAULT_WOE_REGULARIZATION;
use risk_core::error::{Error, Result};
use risk_core::RawValue;
use serde::{Deserialize, Serialize};

fn default_regularization() -> f64 {
    DEFAULT_WOE_REGULARIZATION
}

/// Target counts of one category level in the training data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelCounts {
    /// Rows of this level with target = 1
    pub positives: u64,
    /// Rows of this level with target = 0
    pub negatives: u64,
}

impl LevelCounts {
    /// Create counts
    #[must_use]
    pub const fn new(positives: u64, negatives: u64) -> Self {
        Self {
            positives,
            negatives,
        }
    }
}

/// Fitted mapping for one categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WoeColumn {
    /// Evidence per known level
    levels: HashMap<String, f64>,
    /// Value for levels not seen during fitting
    #[serde(default)]
    unseen: f64,
    /// Value for `null`
    #[serde(default)]
    missing: f64,
}

impl WoeColumn {
    /// Create a column from precomputed evidence values
    #[must_use]
    pub fn new(levels: HashMap<String, f64>, unseen: f64, missing: f64) -> Self {
        Self {
            levels,
            unseen,
            missing,
        }
    }

    /// Compute evidence values from per-level target counts
    #[must_use]
    pub fn from_counts<'a, I>(counts: I, regularization: f64) -> Self
    where
        I: IntoIterator<Item = (&'a str, LevelCounts)>,
    {
        let counts: Vec<(&str, LevelCounts)> = counts.into_iter().collect();
        let total_pos: u64 = counts.iter().map(|(_, c)| c.positives).sum();
        let total_neg: u64 = counts.iter().map(|(_, c)| c.negatives).sum();

        let pos_denom = total_pos as f64 + 2.0 * regularization;
        let neg_denom = total_neg as f64 + 2.0 * regularization;

        let levels = counts
            .into_iter()
            .map(|(level, c)| {
                let pos_rate = (c.positives as f64 + regularization) / pos_denom;
                let neg_rate = (c.negatives as f64 + regularization) / neg_denom;
                (level.to_string(), (pos_rate / neg_rate).ln())
            })
            .collect();

        Self::new(levels, 0.0, 0.0)
    }

    /// Override the unseen-level fallback
    #[must_use]
    pub fn with_unseen(mut self, unseen: f64) -> Self {
        self.unseen = unseen;
        self
    }

    /// Override the missing-value fallback
    #[must_use]
    pub fn with_missing(mut self, missing: f64) -> Self {
        self.missing = missing;
        self
    }

    /// Evidence for a raw value
    #[must_use]
    pub fn encode(&self, value: &RawValue) -> f64 {
        match value {
            RawValue::Null => self.missing,
            RawValue::Text(level) => self.lookup(level),
            other => self.lookup(&other.to_string()),
        }
    }

    fn lookup(&self, level: &str) -> f64 {
        self.levels.get(level).copied().unwrap_or(self.unseen)
    }

    /// Evidence of a known level
    #[must_use]
    pub fn level(&self, level: &str) -> Option<f64> {
        self.levels.get(level).copied()
    }

    /// Unseen-level fallback
    #[must_use]
    pub fn unseen(&self) -> f64 {
        self.unseen
    }

    /// Missing-value fallback
    #[must_use]
    pub fn missing(&self) -> f64 {
        self.missing
    }

    /// Number of known levels
    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    fn non_finite_levels(&self) -> Vec<&str> {
        let mut bad: Vec<&str> = self
            .levels
            .iter()
            .filter(|(_, v)| !v.is_finite())
            .map(|(k, _)| k.as_str())
            .collect();
        if !self.unseen.is_finite() {
            bad.push("<unseen>");
        }
        if !self.missing.is_finite() {
            bad.push("<missing>");
        }
        bad
    }
}

/// Fitted weight-of-evidence encoder for all categorical columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WoeEncoder {
    /// Pseudo-count used at fit time
    #[serde(default = "default_regularization")]
    regularization: f64,
    /// Per-column mappings
    columns: BTreeMap<String, WoeColumn>,
}

impl WoeEncoder {
    /// Create an encoder from fitted columns
    #[must_use]
    pub fn new(columns: BTreeMap<String, WoeColumn>, regularization: f64) -> Self {
        Self {
            regularization,
            columns,
        }
    }

    /// Build an encoder from per-column level counts
    #[must_use]
    pub fn from_counts(
        counts: &BTreeMap<String, Vec<(String, LevelCounts)>>,
        regularization: f64,
    ) -> Self {
        let columns = counts
            .iter()
            .map(|(name, levels)| {
                let column = WoeColumn::from_counts(
                    levels.iter().map(|(level, c)| (level.as_str(), *c)),
                    regularization,
                );
                (name.clone(), column)
            })
            .collect();
        Self::new(columns, regularization)
    }

    /// Mapping of a column
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&WoeColumn> {
        self.columns.get(name)
    }

    /// Regularization used at fit time
    #[must_use]
    pub fn regularization(&self) -> f64 {
        self.regularization
    }

    /// Check that every stored value is finite
    pub fn validate(&self) -> Result<()> {
        let bad: Vec<String> = self
            .columns
            .iter()
            .flat_map(|(name, column)| {
                column
                    .non_finite_levels()
                    .into_iter()
                    .map(move |level| format!("{name}[{level}]"))
            })
            .collect();

        if bad.is_empty() {
            Ok(())
        } else {
            Err(Error::artifact(
                "woe_encoder",
                format!("non-finite evidence values: {}", bad.join(", ")),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gender_column() -> WoeColumn {
        WoeColumn::from_counts(
            [
                ("F", LevelCounts::new(10, 190)),
                ("M", LevelCounts::new(30, 170)),
            ],
            1.0,
        )
    }

    #[test]
    fn test_from_counts_formula() {
        let column = gender_column();
        // P = 40, N = 360, r = 1
        let expected_f = ((11.0 / 42.0) / (191.0 / 362.0_f64)).ln();
        let expected_m = ((31.0 / 42.0) / (171.0 / 362.0_f64)).ln();
        assert!((column.level("F").unwrap() - expected_f).abs() < 1e-12);
        assert!((column.level("M").unwrap() - expected_m).abs() < 1e-12);
        // More defaults than average means positive evidence
        assert!(column.level("M").unwrap() > 0.0);
        assert!(column.level("F").unwrap() < 0.0);
    }

    #[test]
    fn test_unseen_and_missing_fallback() {
        let column = gender_column();
        assert_eq!(column.encode(&RawValue::Text("XNA".into())), 0.0);
        assert_eq!(column.encode(&RawValue::Null), 0.0);

        let column = column.with_unseen(-0.5).with_missing(0.25);
        assert_eq!(column.encode(&RawValue::Text("XNA".into())), -0.5);
        assert_eq!(column.encode(&RawValue::Null), 0.25);
    }

    #[test]
    fn test_numeric_levels_match_by_text() {
        let column = WoeColumn::from_counts(
            [("1", LevelCounts::new(5, 5)), ("2", LevelCounts::new(1, 9))],
            1.0,
        );
        assert_eq!(column.encode(&RawValue::Int(2)), column.level("2").unwrap());
    }

    #[test]
    fn test_encoder_deserialize_defaults() {
        let json = r#"{
            "columns": {
                "CODE_GENDER": { "levels": { "F": -0.15, "M": 0.22 } }
            }
        }"#;
        let encoder: WoeEncoder = serde_json::from_str(json).unwrap();
        assert_eq!(encoder.regularization(), DEFAULT_WOE_REGULARIZATION);
        let column = encoder.column("CODE_GENDER").unwrap();
        assert_eq!(column.unseen(), 0.0);
        assert_eq!(column.num_levels(), 2);
        assert!(encoder.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let mut levels = HashMap::new();
        levels.insert("F".to_string(), f64::INFINITY);
        let mut columns = BTreeMap::new();
        columns.insert("CODE_GENDER".to_string(), WoeColumn::new(levels, 0.0, 0.0));

        let err = WoeEncoder::new(columns, 1.0).validate().unwrap_err();
        assert!(err.to_string().contains("CODE_GENDER[F]"));
    }
}

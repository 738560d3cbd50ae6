//! Fixed standard scaler for numerical fields.
//!
//! Statistics come from the training data and are never refit at request
//! time, so a single row standardizes to the same values it would inside any
//! batch.

use std::collections::BTreeMap;

use risk_core::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Mean and scale of one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Training mean
    pub mean: f64,
    /// Training standard deviation
    pub scale: f64,
}

impl ColumnStats {
    /// Create column statistics
    #[must_use]
    pub const fn new(mean: f64, scale: f64) -> Self {
        Self { mean, scale }
    }

    /// Standardize a value
    #[inline]
    #[must_use]
    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// Per-column standardization statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: BTreeMap<String, ColumnStats>,
}

impl StandardScaler {
    /// Create a scaler, validating its statistics
    ///
    /// A zero scale marks a constant training column and is replaced by 1, so
    /// such a column only gets centred.
    pub fn new(columns: BTreeMap<String, ColumnStats>) -> Result<Self> {
        let mut scaler = Self { columns };
        scaler.normalize()?;
        Ok(scaler)
    }

    /// Compute statistics from training columns (population standard deviation)
    pub fn from_columns<'a, I>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a [f64])>,
    {
        let mut stats = BTreeMap::new();
        for (name, values) in columns {
            if values.is_empty() {
                return Err(Error::artifact(
                    "scaler",
                    format!("column {name} has no values"),
                ));
            }
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            stats.insert(name.to_string(), ColumnStats::new(mean, var.sqrt()));
        }
        Self::new(stats)
    }

    /// Validate statistics after deserialization
    pub fn normalize(&mut self) -> Result<()> {
        let mut bad = Vec::new();
        for (name, stats) in &mut self.columns {
            if !stats.mean.is_finite() || !stats.scale.is_finite() || stats.scale < 0.0 {
                bad.push(name.clone());
            } else if stats.scale == 0.0 {
                tracing::warn!(column = %name, "zero scale in scaler, treating as 1");
                stats.scale = 1.0;
            }
        }

        if bad.is_empty() {
            Ok(())
        } else {
            Err(Error::artifact(
                "scaler",
                format!("invalid statistics for: {}", bad.join(", ")),
            ))
        }
    }

    /// Statistics of a column
    #[must_use]
    pub fn column(&self, name: &str) -> Option<ColumnStats> {
        self.columns.get(name).copied()
    }

    /// Scaled column names
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of scaled columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column is scaled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform() {
        let stats = ColumnStats::new(100.0, 20.0);
        assert!((stats.transform(140.0) - 2.0).abs() < 1e-12);
        assert!((stats.transform(100.0)).abs() < 1e-12);
    }

    #[test]
    fn test_from_columns() {
        let income = [1.0, 2.0, 3.0, 4.0];
        let scaler = StandardScaler::from_columns([("AMT_INCOME_TOTAL", &income[..])]).unwrap();
        let stats = scaler.column("AMT_INCOME_TOTAL").unwrap();
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert!((stats.scale - 1.25_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_scale_becomes_one() {
        let constant = [5.0, 5.0, 5.0];
        let scaler = StandardScaler::from_columns([("FLOORSMIN_AVG", &constant[..])]).unwrap();
        let stats = scaler.column("FLOORSMIN_AVG").unwrap();
        assert_eq!(stats.scale, 1.0);
        assert_eq!(stats.transform(5.0), 0.0);
    }

    #[test]
    fn test_invalid_stats_rejected() {
        let mut columns = BTreeMap::new();
        columns.insert("AMT_CREDIT".to_string(), ColumnStats::new(f64::NAN, 1.0));
        columns.insert("AMT_ANNUITY".to_string(), ColumnStats::new(0.0, -2.0));

        let err = StandardScaler::new(columns).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("AMT_CREDIT"));
        assert!(msg.contains("AMT_ANNUITY"));
    }

    #[test]
    fn test_deserialize() {
        let json = r#"{ "columns": { "CNT_CHILDREN": { "mean": 0.4, "scale": 0.7 } } }"#;
        let mut scaler: StandardScaler = serde_json::from_str(json).unwrap();
        scaler.normalize().unwrap();
        assert_eq!(scaler.len(), 1);
        assert_eq!(scaler.column_names().collect::<Vec<_>>(), vec!["CNT_CHILDREN"]);
    }
}

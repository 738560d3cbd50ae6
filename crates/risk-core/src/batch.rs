//! Column-oriented input batch: field name to one raw value per row.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single raw cell as received from the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// JSON `null`
    Null,
    /// JSON boolean
    Bool(bool),
    /// Integral number
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Text(String),
}

impl RawValue {
    /// Numeric view of the value, if it has one
    ///
    /// Strings are parsed after trimming; booleans and nulls have none.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Int(v) => Some(*v as f64),
            RawValue::Float(v) => Some(*v),
            RawValue::Text(s) => s.trim().parse::<f64>().ok(),
            RawValue::Null | RawValue::Bool(_) => None,
        }
    }

    /// Whether the value is `null`
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => write!(f, "null"),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Int(v) => write!(f, "{v}"),
            RawValue::Float(v) => write!(f, "{v}"),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

/// Named columns of equal length
///
/// Construction (and deserialization) rejects empty and ragged batches, so a
/// `RecordBatch` always has at least one column and one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<RawValue>>")]
#[serde(into = "BTreeMap<String, Vec<RawValue>>")]
pub struct RecordBatch {
    columns: BTreeMap<String, Vec<RawValue>>,
    num_rows: usize,
}

impl RecordBatch {
    /// Build a batch, checking that all columns have the same non-zero length
    pub fn new(columns: BTreeMap<String, Vec<RawValue>>) -> Result<Self> {
        let Some(num_rows) = columns.values().next().map(Vec::len) else {
            return Err(Error::Schema("batch has no columns".to_string()));
        };

        if num_rows == 0 {
            return Err(Error::Schema("batch has no rows".to_string()));
        }

        let ragged: Vec<String> = columns
            .iter()
            .filter(|(_, values)| values.len() != num_rows)
            .map(|(name, values)| format!("{name}={}", values.len()))
            .collect();
        if !ragged.is_empty() {
            return Err(Error::Schema(format!(
                "columns must share one row count ({num_rows}), got {}",
                ragged.join(", ")
            )));
        }

        Ok(Self { columns, num_rows })
    }

    /// Build a batch from `(name, values)` pairs
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<RawValue>)>,
        S: Into<String>,
    {
        Self::new(
            columns
                .into_iter()
                .map(|(name, values)| (name.into(), values))
                .collect(),
        )
    }

    /// Number of rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Values of a column
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[RawValue]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Whether a column is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Field names, sorted
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

impl TryFrom<BTreeMap<String, Vec<RawValue>>> for RecordBatch {
    type Error = Error;

    fn try_from(columns: BTreeMap<String, Vec<RawValue>>) -> Result<Self> {
        Self::new(columns)
    }
}

impl From<RecordBatch> for BTreeMap<String, Vec<RawValue>> {
    fn from(batch: RecordBatch) -> Self {
        batch.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_from_json() {
        let values: Vec<RawValue> =
            serde_json::from_str(r#"[null, true, 3, 2.5, "Y", -10]"#).unwrap();
        assert_eq!(
            values,
            vec![
                RawValue::Null,
                RawValue::Bool(true),
                RawValue::Int(3),
                RawValue::Float(2.5),
                RawValue::Text("Y".into()),
                RawValue::Int(-10),
            ]
        );
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(RawValue::Int(4).as_f64(), Some(4.0));
        assert_eq!(RawValue::Text(" 1.5 ".into()).as_f64(), Some(1.5));
        assert_eq!(RawValue::Text("Laborers".into()).as_f64(), None);
        assert_eq!(RawValue::Bool(true).as_f64(), None);
        assert_eq!(RawValue::Null.as_f64(), None);
    }

    #[test]
    fn test_batch_row_count() {
        let batch = RecordBatch::from_columns([
            ("AMT_CREDIT", vec![RawValue::Float(1.0), RawValue::Float(2.0)]),
            ("FLAG_OWN_CAR", vec!["Y".into(), "N".into()]),
        ])
        .unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 2);
        assert!(batch.contains("AMT_CREDIT"));
        assert_eq!(batch.column("FLAG_OWN_CAR").map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_ragged_batch_rejected() {
        let err = RecordBatch::from_columns([
            ("A", vec![RawValue::Int(1), RawValue::Int(2)]),
            ("B", vec![RawValue::Int(1)]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
        assert!(err.to_string().contains("B=1"));
    }

    #[test]
    fn test_empty_batches_rejected() {
        assert!(RecordBatch::new(BTreeMap::new()).is_err());
        assert!(RecordBatch::from_columns([("A", Vec::new())]).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: std::result::Result<RecordBatch, _> =
            serde_json::from_str(r#"{"A": [1, 2], "B": ["x", "y"]}"#);
        assert_eq!(ok.unwrap().num_rows(), 2);

        let ragged: std::result::Result<RecordBatch, _> =
            serde_json::from_str(r#"{"A": [1, 2], "B": ["x"]}"#);
        assert!(ragged.is_err());
    }
}

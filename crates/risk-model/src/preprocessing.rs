//! Feature preprocessing: named raw columns to the model's numeric matrix.
//!
//! Three passes run in order over the columns the model was trained on:
//! binary flags to 0/1, categoricals to weight of evidence, numerics through
//! the fitted scaler. Columns outside the schema are copied through as
//! numbers. Output column order is the model artifact's `feature_names`.

use std::collections::HashSet;

use ndarray::Array2;
use risk_core::constants::{FLAG_NO, FLAG_YES, UNRESOLVED_FLAG};
use risk_core::error::{Error, Result};
use risk_core::{FeatureKind, FeatureSchema, RawValue, RecordBatch};

use crate::encoder::{WoeColumn, WoeEncoder};
use crate::scaler::{ColumnStats, StandardScaler};
use crate::FeatureMatrix;

/// Map a binary flag to 0/1, or [`UNRESOLVED_FLAG`] if it is neither
#[must_use]
pub fn encode_flag(value: &RawValue) -> f64 {
    match value {
        RawValue::Text(s) if s == FLAG_YES => 1.0,
        RawValue::Text(s) if s == FLAG_NO => 0.0,
        RawValue::Int(1) | RawValue::Bool(true) => 1.0,
        RawValue::Int(0) | RawValue::Bool(false) => 0.0,
        RawValue::Float(v) if *v == 1.0 => 1.0,
        RawValue::Float(v) if *v == 0.0 => 0.0,
        _ => UNRESOLVED_FLAG,
    }
}

/// Numeric reading of a raw value; booleans count as 1/0
fn numeric_value(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.as_f64(),
    }
}

#[derive(Debug, Clone)]
enum ColumnPlan {
    Binary,
    Categorical(WoeColumn),
    Numerical(ColumnStats),
    Passthrough,
}

impl ColumnPlan {
    fn kind(&self) -> FeatureKind {
        match self {
            ColumnPlan::Binary => FeatureKind::Binary,
            ColumnPlan::Categorical(_) => FeatureKind::Categorical,
            ColumnPlan::Numerical(_) => FeatureKind::Numerical,
            ColumnPlan::Passthrough => FeatureKind::Passthrough,
        }
    }
}

#[derive(Debug, Clone)]
struct PlannedColumn {
    name: String,
    plan: ColumnPlan,
}

/// Immutable preprocessing pipeline bound to one model's column order
#[derive(Debug, Clone)]
pub struct Preprocessor {
    columns: Vec<PlannedColumn>,
}

impl Preprocessor {
    /// Plan the transformation of every model column
    ///
    /// Fails if a categorical column has no encoder mapping, a numerical
    /// column has no scaler statistics, or a column is listed twice.
    pub fn new(
        schema: &FeatureSchema,
        feature_order: &[String],
        encoder: &WoeEncoder,
        scaler: &StandardScaler,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        let mut unencoded = Vec::new();
        let mut unscaled = Vec::new();
        let mut columns = Vec::with_capacity(feature_order.len());

        for name in feature_order {
            if !seen.insert(name.as_str()) {
                duplicates.push(name.clone());
                continue;
            }

            let plan = match schema.kind_of(name) {
                FeatureKind::Binary => ColumnPlan::Binary,
                FeatureKind::Categorical => match encoder.column(name) {
                    Some(column) => ColumnPlan::Categorical(column.clone()),
                    None => {
                        unencoded.push(name.clone());
                        continue;
                    }
                },
                FeatureKind::Numerical => match scaler.column(name) {
                    Some(stats) => ColumnPlan::Numerical(stats),
                    None => {
                        unscaled.push(name.clone());
                        continue;
                    }
                },
                FeatureKind::Passthrough => {
                    tracing::warn!(column = %name, "model column outside the feature schema, passing through");
                    ColumnPlan::Passthrough
                }
            };

            columns.push(PlannedColumn {
                name: name.clone(),
                plan,
            });
        }

        let mut problems = Vec::new();
        if !duplicates.is_empty() {
            problems.push(format!("duplicate columns: {}", duplicates.join(", ")));
        }
        if !unencoded.is_empty() {
            problems.push(format!("no encoder mapping for: {}", unencoded.join(", ")));
        }
        if !unscaled.is_empty() {
            problems.push(format!("no scaler statistics for: {}", unscaled.join(", ")));
        }
        if !problems.is_empty() {
            return Err(Error::artifact("preprocessor", problems.join("; ")));
        }

        Ok(Self { columns })
    }

    /// Transform a batch into the model's feature matrix
    pub fn transform(&self, batch: &RecordBatch) -> Result<FeatureMatrix> {
        let missing: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| !batch.contains(&c.name))
            .map(|c| c.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(Error::feature(missing, "missing required field"));
        }

        let mut matrix = Array2::zeros((batch.num_rows(), self.columns.len()));
        let mut invalid = Vec::new();

        self.binary_pass(batch, &mut matrix);
        self.categorical_pass(batch, &mut matrix);
        self.numerical_pass(batch, &mut matrix, &mut invalid);
        self.passthrough_pass(batch, &mut matrix, &mut invalid);

        if !invalid.is_empty() {
            return Err(Error::feature(invalid, "value is not numeric"));
        }

        let non_finite: Vec<&str> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(j, _)| matrix.column(*j).iter().any(|v| !v.is_finite()))
            .map(|(_, c)| c.name.as_str())
            .collect();
        if !non_finite.is_empty() {
            return Err(Error::feature(non_finite, "value is not finite"));
        }

        tracing::trace!(
            rows = matrix.nrows(),
            cols = matrix.ncols(),
            "batch preprocessed"
        );
        Ok(matrix)
    }

    fn planned<'a>(
        &'a self,
        batch: &'a RecordBatch,
    ) -> impl Iterator<Item = (usize, &'a PlannedColumn, &'a [RawValue])> + 'a {
        self.columns
            .iter()
            .enumerate()
            .filter_map(move |(j, c)| batch.column(&c.name).map(|values| (j, c, values)))
    }

    fn binary_pass(&self, batch: &RecordBatch, matrix: &mut FeatureMatrix) {
        for (j, column, values) in self.planned(batch) {
            if let ColumnPlan::Binary = column.plan {
                for (cell, value) in matrix.column_mut(j).iter_mut().zip(values) {
                    *cell = encode_flag(value);
                }
            }
        }
    }

    fn categorical_pass(&self, batch: &RecordBatch, matrix: &mut FeatureMatrix) {
        for (j, column, values) in self.planned(batch) {
            if let ColumnPlan::Categorical(woe) = &column.plan {
                for (cell, value) in matrix.column_mut(j).iter_mut().zip(values) {
                    *cell = woe.encode(value);
                }
            }
        }
    }

    fn numerical_pass(
        &self,
        batch: &RecordBatch,
        matrix: &mut FeatureMatrix,
        invalid: &mut Vec<String>,
    ) {
        for (j, column, values) in self.planned(batch) {
            if let ColumnPlan::Numerical(stats) = &column.plan {
                let mut bad = false;
                for (cell, value) in matrix.column_mut(j).iter_mut().zip(values) {
                    // Missing values are imputed with the training mean.
                    let raw = if value.is_null() {
                        Some(stats.mean)
                    } else {
                        numeric_value(value)
                    };
                    match raw {
                        Some(x) => *cell = stats.transform(x),
                        None => bad = true,
                    }
                }
                if bad {
                    invalid.push(column.name.clone());
                }
            }
        }
    }

    fn passthrough_pass(
        &self,
        batch: &RecordBatch,
        matrix: &mut FeatureMatrix,
        invalid: &mut Vec<String>,
    ) {
        for (j, column, values) in self.planned(batch) {
            if let ColumnPlan::Passthrough = column.plan {
                let mut bad = false;
                for (cell, value) in matrix.column_mut(j).iter_mut().zip(values) {
                    match numeric_value(value) {
                        Some(x) => *cell = x,
                        None => bad = true,
                    }
                }
                if bad {
                    invalid.push(column.name.clone());
                }
            }
        }
    }

    /// Output column names, in order
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Output columns with their treatment, in order
    pub fn column_kinds(&self) -> impl Iterator<Item = (&str, FeatureKind)> {
        self.columns.iter().map(|c| (c.name.as_str(), c.plan.kind()))
    }

    /// Number of output columns
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.columns.len()
    }
}

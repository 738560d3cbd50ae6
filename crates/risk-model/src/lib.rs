//! # risk-model
//!
//! Feature preprocessing and inference for the credit default model.
//!
//! This crate provides:
//! - Loading of the model, weight-of-evidence encoder and scaler artifacts
//! - The preprocessing pipeline from named raw columns to a feature matrix
//! - Logistic and gradient boosted tree classifiers
//! - Risk bucketing of the predicted default probability
//!
//! ## Example
//!
//! ```rust,ignore
//! use risk_model::{ArtifactPaths, InferenceService};
//!
//! let service = InferenceService::load(&ArtifactPaths::default())?;
//! let prediction = service.predict(&batch)?;
//! for result in &prediction.results {
//!     println!("{:.3} {}", result.default_probability, result.risk_category);
//! }
//! ```

#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc
)]

pub mod artifact;
pub mod encoder;
pub mod formatter;
pub mod inference;
pub mod preprocessing;
pub mod scaler;
pub mod service;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Model input: rows are applicants, columns follow the model's feature order
pub type FeatureMatrix = ndarray::Array2<f64>;

pub use artifact::ArtifactPaths;
pub use encoder::{LevelCounts, WoeColumn, WoeEncoder};
pub use formatter::{format_prediction, format_predictions};
pub use inference::{Classifier, ClassifierSpec, ModelArtifact, Predictor};
pub use preprocessing::Preprocessor;
pub use scaler::{ColumnStats, StandardScaler};
pub use service::{BatchPrediction, InferenceService};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifact::ArtifactPaths;
    pub use crate::inference::{Classifier, ModelArtifact, Predictor};
    pub use crate::preprocessing::Preprocessor;
    pub use crate::service::{BatchPrediction, InferenceService};
    pub use crate::FeatureMatrix;
}

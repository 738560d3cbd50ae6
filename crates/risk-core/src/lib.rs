//! # risk-core
//!
//! Core types, feature schema and errors for the credit default risk service.
//!
//! This crate provides:
//! - The feature schema (binary, numerical and categorical field groups)
//! - `RecordBatch`, the validated column-oriented request payload
//! - Prediction output types and risk buckets
//! - The shared error taxonomy
//!
//! ## Example
//!
//! ```rust
//! use risk_core::{FeatureKind, FeatureSchema, RiskCategory};
//!
//! let schema = FeatureSchema::credit_default();
//! assert_eq!(schema.kind_of("FLAG_OWN_CAR"), FeatureKind::Binary);
//! assert_eq!(RiskCategory::from_probability(0.3), RiskCategory::Medium);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::cast_precision_loss)]

pub mod batch;
pub mod constants;
pub mod error;
pub mod schema;
pub mod types;

pub use batch::{RawValue, RecordBatch};
pub use error::{Error, Result};
pub use schema::{FeatureKind, FeatureSchema};
pub use types::{PredictionResult, RiskCategory};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::batch::{RawValue, RecordBatch};
    pub use crate::constants::*;
    pub use crate::error::{Error, Result};
    pub use crate::schema::{FeatureKind, FeatureSchema};
    pub use crate::types::{PredictionResult, RiskCategory};
}

//! # risk-gateway
//!
//! HTTP front end for the credit default risk model.
//!
//! This crate provides:
//! - Configuration from TOML files and environment variables
//! - Prometheus metrics export
//! - The axum router serving `/predict`, `/health` and `/metrics`

#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod metrics;
pub mod server;

pub use config::AppConfig;
pub use metrics::MetricsRegistry;
pub use server::{router, serve, AppState, AppStatus};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::metrics::MetricsRegistry;
    pub use crate::server::{router, serve, AppState, AppStatus};
}

//! Constants used throughout the credit risk service.

/// Service version reported by the health endpoint
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper bound (exclusive) of the "Low Risk" band
pub const LOW_RISK_UPPER: f64 = 0.2;

/// Upper bound (exclusive) of the "Medium Risk" band
pub const MEDIUM_RISK_UPPER: f64 = 0.4;

/// Numeric marker for binary flags that are neither Y/N nor 0/1
pub const UNRESOLVED_FLAG: f64 = -1.0;

/// Encoded value for a binary "Y"
pub const FLAG_YES: &str = "Y";

/// Encoded value for a binary "N"
pub const FLAG_NO: &str = "N";

/// Default WOE regularization (pseudo-count added to each level)
pub const DEFAULT_WOE_REGULARIZATION: f64 = 1.0;

/// Default maximum rows accepted in one request
pub const DEFAULT_MAX_BATCH_ROWS: usize = 1_000;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8080;

/// Default model artifact path
pub const DEFAULT_MODEL_PATH: &str = "models/model.json";

/// Default WOE encoder artifact path
pub const DEFAULT_ENCODER_PATH: &str = "models/woe_encoder.json";

/// Default scaler artifact path
pub const DEFAULT_SCALER_PATH: &str = "models/scaler.json";

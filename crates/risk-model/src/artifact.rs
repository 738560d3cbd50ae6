//! Loading of the persisted model, encoder and scaler artifacts.

use std::path::{Path, PathBuf};

use risk_core::constants::{DEFAULT_ENCODER_PATH, DEFAULT_MODEL_PATH, DEFAULT_SCALER_PATH};
use risk_core::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Filesystem locations of the three artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// Trained classifier with its feature order
    pub model: PathBuf,
    /// Fitted weight-of-evidence encoder
    pub encoder: PathBuf,
    /// Fitted standard scaler
    pub scaler: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model: PathBuf::from(DEFAULT_MODEL_PATH),
            encoder: PathBuf::from(DEFAULT_ENCODER_PATH),
            scaler: PathBuf::from(DEFAULT_SCALER_PATH),
        }
    }
}

/// Read and decode a JSON artifact
///
/// Every failure is reported as [`Error::ArtifactLoad`] carrying the path.
pub fn load_json<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let shown = path.display().to_string();

    let content =
        std::fs::read_to_string(path).map_err(|e| Error::artifact(&shown, e.to_string()))?;
    let artifact =
        serde_json::from_str(&content).map_err(|e| Error::artifact(&shown, e.to_string()))?;

    tracing::debug!(path = %shown, bytes = content.len(), "artifact loaded");
    Ok(artifact)
}

/// Encode an artifact as pretty JSON and write it
pub fn save_json<T, P>(artifact: &T, path: P) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let content = serde_json::to_string_pretty(artifact)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("risk-model-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_default_paths() {
        let paths = ArtifactPaths::default();
        assert_eq!(paths.model, PathBuf::from("models/model.json"));
        assert_eq!(paths.encoder, PathBuf::from("models/woe_encoder.json"));
        assert_eq!(paths.scaler, PathBuf::from("models/scaler.json"));
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("artifact.json");
        let mut value = BTreeMap::new();
        value.insert("AMT_CREDIT".to_string(), 1.5_f64);

        save_json(&value, &path).unwrap();
        let loaded: BTreeMap<String, f64> = load_json(&path).unwrap();
        assert_eq!(loaded, value);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_artifact_error() {
        let err = load_json::<BTreeMap<String, f64>, _>(temp_path("does-not-exist.json"))
            .unwrap_err();
        assert!(matches!(err, Error::ArtifactLoad { .. }));
        assert!(err.to_string().contains("does-not-exist.json"));
    }

    #[test]
    fn test_corrupt_file_is_artifact_error() {
        let path = temp_path("corrupt.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_json::<BTreeMap<String, f64>, _>(&path).unwrap_err();
        assert!(matches!(err, Error::ArtifactLoad { .. }));

        std::fs::remove_file(&path).ok();
    }
}

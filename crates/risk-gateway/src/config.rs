//! Application configuration.
//!
//! Resolution order: TOML file (if any), then environment variables, then
//! command line flags applied by the binary.

use std::path::{Path, PathBuf};

use anyhow::Context;
use risk_core::constants::{
    DEFAULT_ENCODER_PATH, DEFAULT_MAX_BATCH_ROWS, DEFAULT_MODEL_PATH, DEFAULT_PORT,
    DEFAULT_SCALER_PATH,
};
use risk_model::ArtifactPaths;
use serde::{Deserialize, Serialize};

/// Environment variable naming an optional TOML config file
pub const CONFIG_ENV: &str = "RISK_CONFIG";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name
    pub name: String,
    /// Bind address
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// Debug mode: verbose logs and error details in 500 responses
    pub debug: bool,
    /// Log level
    pub log_level: String,
    /// Model artifact path
    pub model_path: PathBuf,
    /// WOE encoder artifact path
    pub encoder_path: PathBuf,
    /// Scaler artifact path
    pub scaler_path: PathBuf,
    /// Largest batch accepted by `/predict`
    pub max_batch_rows: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "credit-risk".to_string(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            debug: false,
            log_level: "info".to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            encoder_path: PathBuf::from(DEFAULT_ENCODER_PATH),
            scaler_path: PathBuf::from(DEFAULT_SCALER_PATH),
            max_batch_rows: DEFAULT_MAX_BATCH_ROWS,
        }
    }
}

/// Truthy environment values
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl AppConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Load from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for environment variables
    ///
    /// If [`CONFIG_ENV`] is set its file is the base, otherwise the defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Override fields from environment variables
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?;
        }
        if let Some(debug) = lookup("DEBUG") {
            self.debug = parse_bool(&debug);
            if self.debug {
                self.log_level = "debug".to_string();
            }
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(path) = lookup("MODEL_PATH") {
            self.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("ENCODER_PATH") {
            self.encoder_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("SCALER_PATH") {
            self.scaler_path = PathBuf::from(path);
        }
        if let Some(rows) = lookup("MAX_BATCH_ROWS") {
            self.max_batch_rows = rows
                .trim()
                .parse()
                .with_context(|| format!("MAX_BATCH_ROWS must be a positive integer, got {rows:?}"))?;
        }
        self.validate()
    }

    /// Check values that cannot be expressed in the types
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.max_batch_rows > 0, "max_batch_rows must be positive");
        anyhow::ensure!(!self.host.trim().is_empty(), "host must not be empty");
        Ok(())
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Artifact locations
    #[must_use]
    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.model_path.clone(),
            encoder: self.encoder_path.clone(),
            scaler: self.scaler_path.clone(),
        }
    }

    /// `host:port`
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.model_path, PathBuf::from("models/model.json"));
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("DEBUG", "true"),
            ("MODEL_PATH", "/srv/model.json"),
            ("ENCODER_PATH", "/srv/woe.json"),
            ("SCALER_PATH", "/srv/scaler.json"),
            ("MAX_BATCH_ROWS", "25"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert!(config.debug);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.max_batch_rows, 25);

        let paths = config.artifact_paths();
        assert_eq!(paths.model, PathBuf::from("/srv/model.json"));
        assert_eq!(paths.encoder, PathBuf::from("/srv/woe.json"));
        assert_eq!(paths.scaler, PathBuf::from("/srv/scaler.json"));
    }

    #[test]
    fn test_debug_values() {
        for (value, expected) in [("1", true), ("Yes", true), ("false", false), ("", false)] {
            let config = AppConfig::from_lookup(lookup(&[("DEBUG", value)])).unwrap();
            assert_eq!(config.debug, expected, "DEBUG={value}");
        }
    }

    #[test]
    fn test_invalid_port() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_zero_batch_rows_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("MAX_BATCH_ROWS", "0")])).is_err());
    }

    #[test]
    fn test_toml_file_with_env_override() {
        let path = std::env::temp_dir().join(format!("risk-config-{}.toml", std::process::id()));
        std::fs::write(&path, "port = 7000\nmodel_path = \"/opt/model.json\"\n").unwrap();

        let path_str = path.display().to_string();
        let config = AppConfig::from_lookup(lookup(&[
            (CONFIG_ENV, path_str.as_str()),
            ("PORT", "7001"),
        ]))
        .unwrap();

        assert_eq!(config.port, 7001);
        assert_eq!(config.model_path, PathBuf::from("/opt/model.json"));
        assert_eq!(config.scaler_path, PathBuf::from("models/scaler.json"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("risk-config-save-{}.toml", std::process::id()));
        let config = AppConfig {
            port: 8181,
            ..AppConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
        std::fs::remove_file(&path).ok();
    }
}

//! Layered configuration: CLI flags > environment variables > TOML
//! config file > built-in defaults, per §6.
//!
//! Mirrors the teacher's `ConfigLoader`/`merge()`/`validate()` shape,
//! adapted to SCIO's precedence axis (source-of-value, not
//! system/team/project/user scope).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Flat, documented configuration surface. Every field has a built-in
/// default; a TOML file overlays it, environment variables overlay
/// the file, and CLI flags overlay everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backpressure threshold: submit is rejected once
    /// `max(depth_docs, depth_analyze) >= max_jobs`.
    pub max_jobs: usize,

    /// HTTP bind address for the stage-A API.
    pub http_bind: String,

    /// Default request timeout (seconds) for extractor/sink calls.
    pub http_timeout_secs: u64,

    /// Index write timeout (seconds), longer than the default per §5.
    pub index_timeout_secs: u64,

    /// Path to the blob store root directory.
    pub blob_store_path: PathBuf,

    /// Path to the threat-actor alias file.
    pub threatactor_alias_path: Option<PathBuf>,

    /// Path to the tools alias file.
    pub tools_alias_path: Option<PathBuf>,

    /// Path to the sector alias file.
    pub sector_alias_path: Option<PathBuf>,

    /// Path to the country alias file (used by `locations`).
    pub country_alias_path: Option<PathBuf>,

    /// Abbreviations forced to uppercase during normalization (e.g.
    /// "APT", "BRONZE").
    pub uppercase_abbreviations: Vec<String>,

    /// Metadata keys treated as dates and strict-ISO-8601-filtered
    /// before indexing.
    pub date_fields: Vec<String>,

    /// If set, stage C POSTs the result JSON here.
    pub sink_url: Option<String>,

    /// If set, stage C upserts the result by hexdigest here.
    pub index_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_jobs: 100,
            http_bind: "127.0.0.1:8888".to_string(),
            http_timeout_secs: 60,
            index_timeout_secs: 180,
            blob_store_path: PathBuf::from("./data/blobs"),
            threatactor_alias_path: None,
            tools_alias_path: None,
            sector_alias_path: None,
            country_alias_path: None,
            uppercase_abbreviations: vec!["APT".to_string(), "BRONZE".to_string()],
            date_fields: vec![
                "Creation-Date".to_string(),
                "Last-Modified".to_string(),
                "Analyzed-Date".to_string(),
            ],
            sink_url: None,
            index_url: None,
        }
    }
}

impl Config {
    /// Load the built-in default, overlay a TOML file if present, then
    /// overlay recognized `SCIO_*` environment variables.
    pub fn load(config_path: Option<&Path>) -> Result<Config> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                let text = std::fs::read_to_string(path)?;
                let from_file: Config = toml::from_str(&text)?;
                config = from_file;
            }
        }

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("SCIO_MAX_JOBS") {
            if let Ok(n) = v.parse() {
                self.max_jobs = n;
            }
        }
        if let Ok(v) = std::env::var("SCIO_HTTP_BIND") {
            self.http_bind = v;
        }
        if let Ok(v) = std::env::var("SCIO_SINK_URL") {
            self.sink_url = Some(v);
        }
        if let Ok(v) = std::env::var("SCIO_INDEX_URL") {
            self.index_url = Some(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_jobs == 0 {
            return Err(Error::Configuration(
                "max_jobs must be greater than zero".to_string(),
            ));
        }
        if self.http_bind.is_empty() {
            return Err(Error::Configuration(
                "http_bind must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The XDG-style user config directory SCIO looks for `scio.toml`
    /// in, mirroring the original's `scio_config.py` convention.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("scio").join("scio.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_jobs_rejected() {
        let mut config = Config::default();
        config.max_jobs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/scio.toml"))).unwrap();
        assert_eq!(config.max_jobs, 100);
    }

    #[test]
    fn test_load_overlays_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scio.toml");
        std::fs::write(&path, "max_jobs = 5\nhttp_bind = \"0.0.0.0:9000\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.max_jobs, 5);
        assert_eq!(config.http_bind, "0.0.0.0:9000");
    }
}

// Copyright (c), BioPredict Contributors
// SPDX-License-Identifier: Apache-2.0

//! Server configuration.
//!
//! Layered as: embedded `default_config.yaml`, then an optional YAML file named
//! by `BIOPREDICT_CONFIG`, then individual `BIOPREDICT_*` environment variables.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an override YAML file.
pub const CONFIG_PATH_ENV: &str = "BIOPREDICT_CONFIG";
pub const LISTEN_ADDR_ENV: &str = "BIOPREDICT_LISTEN_ADDR";
pub const ADMIN_ADDR_ENV: &str = "BIOPREDICT_ADMIN_ADDR";
pub const DATABASE_ENV: &str = "BIOPREDICT_DATABASE";

/// Upper bound for `history_limit` and for the `?limit=` query parameter.
pub const MAX_HISTORY_LIMIT: usize = 100;

lazy_static::lazy_static! {
    /// Built-in defaults, parsed once from the YAML embedded at compile time.
    pub static ref DEFAULT_CONFIG: ServerConfig = {
        let config_str = include_str!("default_config.yaml");
        serde_yaml::from_str(config_str)
            .expect("Failed to parse default_config.yaml")
    };
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Public API listener
    pub listen_addr: SocketAddr,
    /// Host-only listener for `/ping` and token issuing
    pub admin_addr: SocketAddr,
    /// SQLite file; `:memory:` keeps everything in process
    pub database_path: PathBuf,
    /// CORS origins; empty or `*` allows any origin
    pub allowed_origins: Vec<String>,
    /// Include scoring error details in 500 responses (development only)
    pub expose_error_details: bool,
    /// Default number of records returned by the history endpoint
    pub history_limit: usize,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

/// Keys accepted in an override file. Anything left out keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverrides {
    listen_addr: Option<SocketAddr>,
    admin_addr: Option<SocketAddr>,
    database_path: Option<PathBuf>,
    allowed_origins: Option<Vec<String>>,
    expose_error_details: Option<bool>,
    history_limit: Option<usize>,
    log_filter: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = lookup(CONFIG_PATH_ENV) {
            config.merge_file(Path::new(&path))?;
        }
        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge_yaml(&raw)
    }

    pub fn merge_yaml(&mut self, raw: &str) -> Result<(), ConfigError> {
        if raw.trim().is_empty() {
            return Ok(());
        }
        let overrides: ConfigOverrides = serde_yaml::from_str(raw)?;
        if let Some(v) = overrides.listen_addr {
            self.listen_addr = v;
        }
        if let Some(v) = overrides.admin_addr {
            self.admin_addr = v;
        }
        if let Some(v) = overrides.database_path {
            self.database_path = v;
        }
        if let Some(v) = overrides.allowed_origins {
            self.allowed_origins = v;
        }
        if let Some(v) = overrides.expose_error_details {
            self.expose_error_details = v;
        }
        if let Some(v) = overrides.history_limit {
            self.history_limit = v;
        }
        if let Some(v) = overrides.log_filter {
            self.log_filter = v;
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = lookup(LISTEN_ADDR_ENV) {
            self.listen_addr = parse_addr(LISTEN_ADDR_ENV, &v)?;
        }
        if let Some(v) = lookup(ADMIN_ADDR_ENV) {
            self.admin_addr = parse_addr(ADMIN_ADDR_ENV, &v)?;
        }
        if let Some(v) = lookup(DATABASE_ENV) {
            self.database_path = PathBuf::from(v);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 || self.history_limit > MAX_HISTORY_LIMIT {
            return Err(ConfigError::InvalidValue {
                key: "history_limit".to_string(),
                value: self.history_limit.to_string(),
            });
        }
        Ok(())
    }

    /// True when CORS should accept any origin.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

fn parse_addr(key: &str, value: &str) -> Result<SocketAddr, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn embedded_defaults_parse() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr.port(), 5000);
        assert!(config.admin_addr.ip().is_loopback());
        assert_eq!(config.history_limit, 10);
        assert!(!config.expose_error_details);
        assert!(config
            .allowed_origins
            .contains(&"http://localhost:5173".to_string()));
    }

    #[test]
    fn partial_yaml_only_touches_listed_keys() {
        let mut config = ServerConfig::default();
        config
            .merge_yaml("history_limit: 25\nexpose_error_details: true\n")
            .unwrap();
        assert_eq!(config.history_limit, 25);
        assert!(config.expose_error_details);
        assert_eq!(config.listen_addr, DEFAULT_CONFIG.listen_addr);
    }

    #[test]
    fn empty_yaml_is_a_no_op() {
        let mut config = ServerConfig::default();
        config.merge_yaml("  \n").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut config = ServerConfig::default();
        let err = config.merge_yaml("histroy_limit: 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_win() {
        let config = ServerConfig::load_with(lookup_from(&[
            (LISTEN_ADDR_ENV, "127.0.0.1:8080"),
            (DATABASE_ENV, ":memory:"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.database_path, PathBuf::from(":memory:"));
    }

    #[test]
    fn bad_env_address_is_an_error() {
        let err = ServerConfig::load_with(lookup_from(&[(ADMIN_ADDR_ENV, "not-an-addr")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, ADMIN_ADDR_ENV),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn file_named_by_env_is_merged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "allowed_origins: [\"*\"]").unwrap();
        writeln!(file, "history_limit: 50").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = ServerConfig::load_with(lookup_from(&[(CONFIG_PATH_ENV, path.as_str())])).unwrap();
        assert!(config.allows_any_origin());
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ServerConfig::load_with(lookup_from(&[(
            CONFIG_PATH_ENV,
            "/nonexistent/biopredict.yaml",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn zero_history_limit_is_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "history_limit: 0").unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert!(ServerConfig::load_with(lookup_from(&[(CONFIG_PATH_ENV, path.as_str())])).is_err());
    }
}

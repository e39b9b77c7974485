//! Service configuration
//!
//! Sources, lowest to highest precedence: built-in defaults, the TOML file,
//! environment overrides. The result is validated once; invalid
//! configuration is fatal at startup.

use std::path::{Path, PathBuf};

use callguard_core::{ConfigError, RuleConfig};
use callguard_gate::{GateConfig, RecorderConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {name}: {value:?}")]
    Env { name: String, value: String },

    #[error("validation error: {0}")]
    Invalid(#[from] ConfigError),
}

/// Where events and block entries live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process memory; lost on restart
    Memory,
    /// JSONL journal + SQLite block list under `data_dir`
    #[default]
    Disk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn journal_dir(&self) -> PathBuf {
        self.data_dir.join("queries")
    }

    pub fn blocklist_path(&self) -> PathBuf {
        self.data_dir.join("blocklist.db")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Root configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CallGuardConfig {
    #[serde(default)]
    pub rules: RuleConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub recorder: RecorderConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl CallGuardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;
        self.gate.validate()?;
        self.recorder.validate()?;
        Ok(())
    }
}

/// Loads, overrides and validates [`CallGuardConfig`]
pub struct ConfigLoader {
    config: CallGuardConfig,
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Built-in defaults plus process environment
    pub fn from_env() -> Result<Self, LoadError> {
        Self::finish(CallGuardConfig::default(), None, env_lookup)
    }

    /// Load a TOML file, then apply the process environment
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LoadError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: CallGuardConfig = toml::from_str(&content)?;

        Self::finish(config, Some(path.to_path_buf()), env_lookup)
    }

    /// Load from a string with an explicit environment
    pub fn load_str_with_env<F>(content: &str, lookup: F) -> Result<Self, LoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config: CallGuardConfig = toml::from_str(content)?;
        Self::finish(config, None, lookup)
    }

    /// Load from a string, ignoring the environment
    pub fn load_str(content: &str) -> Result<Self, LoadError> {
        Self::load_str_with_env(content, |_| None)
    }

    pub fn get(&self) -> &CallGuardConfig {
        &self.config
    }

    pub fn into_config(self) -> CallGuardConfig {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn finish<F>(
        mut config: CallGuardConfig,
        config_path: Option<PathBuf>,
        lookup: F,
    ) -> Result<Self, LoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        apply_env_overrides(&mut config, lookup)?;
        config.validate()?;

        Ok(Self {
            config,
            config_path,
        })
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Environment variable names as deployed
fn apply_env_overrides<F>(config: &mut CallGuardConfig, lookup: F) -> Result<(), LoadError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = parse_env(&lookup, "MAX_DISTINCT_NATIONAL_IDS")? {
        config.rules.unique_national_id_limit = v;
    }
    if let Some(v) = parse_env(&lookup, "DAY_PERIOD")? {
        config.rules.day_period = v;
    }
    if let Some(v) = parse_env(&lookup, "WEEK_PERIOD")? {
        config.rules.week_period = v;
    }
    if let Some(v) = parse_env(&lookup, "MONTH_PERIOD")? {
        config.rules.month_period = v;
    }
    if let Some(v) = parse_env(&lookup, "PORT")? {
        config.server.port = v;
    }
    if let Some(dir) = lookup("CALLGUARD_DATA_DIR") {
        config.storage.data_dir = PathBuf::from(dir);
    }
    Ok(())
}

fn parse_env<F, T>(lookup: &F, name: &str) -> Result<Option<T>, LoadError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| LoadError::Env {
                name: name.to_string(),
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callguard_gate::FailPolicy;
    use std::collections::HashMap;

    #[test]
    fn test_empty_file_uses_defaults() {
        let loader = ConfigLoader::load_str("").unwrap();
        let config = loader.get();

        assert_eq!(config.rules, RuleConfig::default());
        assert_eq!(config.storage.backend, StorageBackend::Disk);
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.gate.fail_policy, FailPolicy::FailClosed);
    }

    #[test]
    fn test_load_string() {
        let config_str = r#"
[rules]
unique_national_id_limit = 5
month_period = 60

[gate]
fail_policy = "fail_open"

[storage]
backend = "memory"
data_dir = "/var/lib/callguard"

[server]
port = 9090
"#;

        let config = ConfigLoader::load_str(config_str).unwrap().into_config();

        assert_eq!(config.rules.unique_national_id_limit, 5);
        assert_eq!(config.rules.week_period, 7);
        assert_eq!(config.rules.month_period, 60);
        assert_eq!(config.gate.fail_policy, FailPolicy::FailOpen);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(
            config.storage.blocklist_path(),
            PathBuf::from("/var/lib/callguard/blocklist.db")
        );
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("MAX_DISTINCT_NATIONAL_IDS", "4"),
            ("DAY_PERIOD", "2"),
            ("PORT", "7000"),
            ("CALLGUARD_DATA_DIR", "/tmp/cg"),
        ]
        .into_iter()
        .collect();

        let config = ConfigLoader::load_str_with_env("[rules]\nunique_national_id_limit = 9\n", |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap()
        .into_config();

        assert_eq!(config.rules.unique_national_id_limit, 4);
        assert_eq!(config.rules.day_period, 2);
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.storage.journal_dir(), PathBuf::from("/tmp/cg/queries"));
    }

    #[test]
    fn test_unparseable_env_is_error() {
        let result = ConfigLoader::load_str_with_env("", |k| {
            (k == "WEEK_PERIOD").then(|| "seven".to_string())
        });

        assert!(matches!(result, Err(LoadError::Env { name, .. }) if name == "WEEK_PERIOD"));
    }

    #[test]
    fn test_validation_rejects_zero_limit() {
        let result = ConfigLoader::load_str("[rules]\nunique_national_id_limit = 0\n");
        assert!(matches!(result, Err(LoadError::Invalid(ConfigError::InvalidThreshold(_)))));
    }

    #[test]
    fn test_oversized_env_period_fails_at_load() {
        let result = ConfigLoader::load_str_with_env("", |k| {
            (k == "MONTH_PERIOD").then(|| "200000000".to_string())
        });

        assert!(matches!(result, Err(LoadError::Invalid(ConfigError::InvalidThreshold(_)))));
    }

    #[test]
    fn test_validation_rejects_negative_period() {
        let result = ConfigLoader::load_str("[rules]\nday_period = -1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::load_file("/nonexistent/callguard.toml");
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }
}

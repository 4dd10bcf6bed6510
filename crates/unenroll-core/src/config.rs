use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reason::CUSTOM_REASON_KEY;

const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UnenrollConfig {
    pub version: u32,
    #[serde(default)]
    pub store: Option<PathBuf>,
    #[serde(default)]
    pub reasons: Vec<ReasonSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReasonSpec {
    pub key: String,
    pub label: String,
}

impl Default for UnenrollConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            store: None,
            reasons: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve home directory for config path")]
    HomeDirectoryUnavailable,
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {message}")]
    Validation { message: String },
}

pub fn resolve_config_dir() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(base_dirs.home_dir().join(".config").join("unenroll"))
}

pub fn resolve_config_path() -> Result<PathBuf, ConfigError> {
    Ok(resolve_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> Result<PathBuf, ConfigError> {
    Ok(resolve_config_dir()?.join("enrollments.toml"))
}

/// Missing files are not an error: the built-in defaults apply.
pub fn load_config_or_default(path: &Path) -> Result<UnenrollConfig, ConfigError> {
    if !path.exists() {
        return Ok(UnenrollConfig::default());
    }
    load_config(path)
}

pub fn load_config(path: &Path) -> Result<UnenrollConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: UnenrollConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&parsed)?;
    Ok(parsed)
}

pub fn validate_config(config: &UnenrollConfig) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("version must be {CONFIG_VERSION}"),
        });
    }

    let mut seen = BTreeSet::<&str>::new();
    for (index, reason) in config.reasons.iter().enumerate() {
        let key = reason.key.trim();
        if key.is_empty() {
            return Err(ConfigError::Validation {
                message: format!("reasons[{index}] key must be non-empty"),
            });
        }
        if key == CUSTOM_REASON_KEY {
            return Err(ConfigError::Validation {
                message: format!(
                    "reasons[{index}] key '{CUSTOM_REASON_KEY}' is reserved for free-text reasons"
                ),
            });
        }
        if reason.label.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("reasons[{index}] label must be non-empty"),
            });
        }
        if !seen.insert(key) {
            return Err(ConfigError::Validation {
                message: format!("reasons[{index}] duplicates key '{key}'"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_config_from_toml(raw: &str) -> Result<UnenrollConfig, ConfigError> {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        fs::write(file.path(), raw).expect("write temp config");
        load_config(file.path())
    }

    #[test]
    fn accepts_minimal_config() {
        let config = load_config_from_toml("version = 1\n").expect("valid config");
        assert!(config.reasons.is_empty());
        assert!(config.store.is_none());
    }

    #[test]
    fn accepts_custom_reasons_and_store() {
        let raw = r#"
version = 1
store = "/tmp/enrollments.toml"

[[reasons]]
key = "schedule"
label = "My schedule changed"

[[reasons]]
key = "cost"
label = "Too expensive"
"#;

        let config = load_config_from_toml(raw).expect("valid config");
        assert_eq!(config.reasons.len(), 2);
        assert_eq!(config.reasons[1].key, "cost");
        assert_eq!(config.store, Some(PathBuf::from("/tmp/enrollments.toml")));
    }

    #[test]
    fn rejects_unknown_version() {
        let error = load_config_from_toml("version = 2\n").expect_err("config should fail");
        assert!(error.to_string().contains("version must be 1"));
    }

    #[test]
    fn rejects_reserved_custom_key() {
        let raw = r#"
version = 1

[[reasons]]
key = "custom"
label = "Other"
"#;

        let error = load_config_from_toml(raw).expect_err("config should fail");
        assert!(error.to_string().contains("reserved"));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let raw = r#"
version = 1

[[reasons]]
key = "time"
label = "No time"

[[reasons]]
key = "time"
label = "Still no time"
"#;

        let error = load_config_from_toml(raw).expect_err("config should fail");
        assert!(error.to_string().contains("duplicates key 'time'"));
    }

    #[test]
    fn rejects_empty_label() {
        let raw = r#"
version = 1

[[reasons]]
key = "time"
label = "  "
"#;

        let error = load_config_from_toml(raw).expect_err("config should fail");
        assert!(error.to_string().contains("label must be non-empty"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let error = load_config_from_toml("version = ").expect_err("config should fail");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config =
            load_config_or_default(&temp.path().join("config.toml")).expect("default config");
        assert_eq!(config, UnenrollConfig::default());
    }
}

//! Application configuration.
//!
//! # Responsibility
//! - Describe which backend to use and how to log.
//! - Load from JSON, then let `CRISISCONNECT_*` environment variables
//!   override individual fields.
//!
//! # Invariants
//! - A config returned by `load` has passed `validate`.

use crate::directory::Location;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_BACKEND: &str = "CRISISCONNECT_BACKEND";
pub const ENV_DB_PATH: &str = "CRISISCONNECT_DB_PATH";
pub const ENV_SUPABASE_URL: &str = "CRISISCONNECT_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "CRISISCONNECT_SUPABASE_ANON_KEY";
pub const ENV_LOG_LEVEL: &str = "CRISISCONNECT_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CRISISCONNECT_LOG_DIR";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Backend selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// SQLite file; `None` keeps everything in memory.
    Local {
        #[serde(default)]
        database_path: Option<PathBuf>,
    },
    /// Hosted Supabase project.
    Rest { url: String, anon_key: String },
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Local {
            database_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Used when the device cannot report a position.
    pub default_location: Location,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            log_level: None,
            log_dir: None,
            default_location: Location::chinhoyi(),
        }
    }
}

impl AppConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Optional file, then process environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup` (normally the process environment).
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(kind) = get(ENV_BACKEND) {
            let is_rest = matches!(self.backend, BackendConfig::Rest { .. });
            match (kind.trim().to_ascii_lowercase().as_str(), is_rest) {
                ("local", false) | ("rest", true) => {}
                ("local", _) => {
                    self.backend = BackendConfig::Local {
                        database_path: None,
                    }
                }
                ("rest", _) => {
                    self.backend = BackendConfig::Rest {
                        url: String::new(),
                        anon_key: String::new(),
                    }
                }
                (other, _) => {
                    return Err(ConfigError::Invalid(format!(
                        "{ENV_BACKEND} must be `local` or `rest`, got `{other}`"
                    )))
                }
            }
        }

        match &mut self.backend {
            BackendConfig::Local { database_path } => {
                if let Some(path) = get(ENV_DB_PATH) {
                    *database_path = Some(PathBuf::from(path));
                }
            }
            BackendConfig::Rest { url, anon_key } => {
                if let Some(value) = get(ENV_SUPABASE_URL) {
                    *url = value;
                }
                if let Some(value) = get(ENV_SUPABASE_ANON_KEY) {
                    *anon_key = value;
                }
            }
        }

        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.log_level = Some(level);
        }
        if let Some(dir) = get(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let BackendConfig::Rest { url, anon_key } = &self.backend {
            let url = url.trim();
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::Invalid(format!(
                    "supabase url must start with http:// or https://, got `{url}`"
                )));
            }
            if anon_key.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "supabase anon key cannot be empty".to_string(),
                ));
            }
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        if !self.default_location.is_valid() {
            return Err(ConfigError::Invalid(
                "default_location is out of range".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, BackendConfig, ConfigError, ENV_BACKEND, ENV_SUPABASE_ANON_KEY};
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_in_memory_local_backend() {
        let config = AppConfig::from_json_str("{}").expect("empty object should parse");
        assert_eq!(
            config.backend,
            BackendConfig::Local {
                database_path: None
            }
        );
        assert_eq!(config.default_location.label.as_deref(), Some("Chinhoyi"));
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn parses_rest_backend() {
        let config = AppConfig::from_json_str(
            r#"{"backend":{"kind":"rest","url":"https://demo.supabase.co","anon_key":"anon"},"log_level":"info"}"#,
        )
        .expect("rest config should parse");
        assert!(matches!(config.backend, BackendConfig::Rest { .. }));
        config.validate().expect("rest config is valid");
    }

    #[test]
    fn env_switches_backend_and_requires_key() {
        let mut config = AppConfig::default();
        config
            .apply_env_with(env(&[
                (ENV_BACKEND, "rest"),
                ("CRISISCONNECT_SUPABASE_URL", "https://demo.supabase.co"),
            ]))
            .expect("env should apply");
        let err = config.validate().expect_err("missing anon key must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));

        config
            .apply_env_with(env(&[(ENV_SUPABASE_ANON_KEY, "anon")]))
            .expect("env should apply");
        config.validate().expect("complete rest config is valid");
    }

    #[test]
    fn unknown_backend_kind_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_with(env(&[(ENV_BACKEND, "firebase")]))
            .expect_err("unknown backend must fail");
        assert!(err.to_string().contains("firebase"));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let config = AppConfig::from_json_str(r#"{"log_dir":"logs"}"#).expect("parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"backend":{{"kind":"local","database_path":"/tmp/cc.db"}}}}"#)
            .expect("write config");
        let config = AppConfig::from_file(file.path()).expect("file config should load");
        assert!(matches!(
            config.backend,
            BackendConfig::Local {
                database_path: Some(_)
            }
        ));
    }
}

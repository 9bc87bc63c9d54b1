//! JSON configuration shared by the CLI and embedding dashboards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::schema::comment_log::DEFAULT_KEY;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "WELLNOTES_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WellnotesConfig {
    /// DuckDB database file. In-memory when absent.
    #[serde(default)]
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub comments: CommentsConfig,
}

/// Where the comment log lives and how entities are keyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentsConfig {
    /// Locator of the canonical log; see [`crate::resolve_path`].
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_keys")]
    pub keys: Vec<String>,
    #[serde(default)]
    pub salt: i64,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            keys: default_keys(),
            salt: 0,
        }
    }
}

fn default_source() -> String {
    "comments".to_string()
}

fn default_keys() -> Vec<String> {
    vec![DEFAULT_KEY.to_string()]
}

impl WellnotesConfig {
    /// Read a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), source = %config.comments.source, "loaded config");
        Ok(config)
    }

    /// Load from `path` if given, else from `$WELLNOTES_CONFIG`, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(p) if !p.is_empty() => Self::load(Path::new(&p)),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_use_synthetic_key() {
        let config: WellnotesConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.comments.keys, vec!["__deposit"]);
        assert_eq!(config.comments.salt, 0);
        assert!(config.database.is_none());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"comments": {{"source": "parquet path=data/comments", "keys": ["__deposit", "__well_num"], "salt": 3}}}}"#
        )
        .unwrap();

        let config = WellnotesConfig::load(file.path()).unwrap();
        assert_eq!(config.comments.keys.len(), 2);
        assert_eq!(config.comments.salt, 3);
        assert_eq!(config.comments.source, "parquet path=data/comments");
    }

    #[test]
    fn missing_file_errors() {
        let result = WellnotesConfig::load(Path::new("/nonexistent/wellnotes.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn malformed_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let result = WellnotesConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}

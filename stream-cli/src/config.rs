use std::path::Path;
use std::path::PathBuf;

use dirs::home_dir;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "config.toml";
const SONGSMITH_HOME_ENV: &str = "SONGSMITH_HOME";
const DEFAULT_LOG_LEVEL: &str = "error";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("chunk_bytes must be greater than zero")]
    ZeroChunkBytes,
}

/// Settings for replaying a recorded response, loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    /// Number of bytes handed to the parser per chunk.
    pub chunk_bytes: usize,
    /// Print delta lines for chunks that produced no text.
    pub emit_empty: bool,
    /// Filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: 1,
            emit_empty: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ReplayConfig {
    /// Load from `explicit` if given, else from `$SONGSMITH_HOME/config.toml` when that file
    /// exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        let home = std::env::var(SONGSMITH_HOME_ENV)
            .ok()
            .filter(|val| !val.is_empty());
        match find_songsmith_home_from_env(home.as_deref()) {
            Some(home) if home.join(CONFIG_FILE_NAME).is_file() => {
                Self::from_path(&home.join(CONFIG_FILE_NAME))
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }

    fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checked after command-line overrides are applied, so a flag can repair a file value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_bytes == 0 {
            return Err(ConfigError::ZeroChunkBytes);
        }
        Ok(())
    }
}

/// `SONGSMITH_HOME` when set, otherwise `~/.songsmith`.
fn find_songsmith_home_from_env(songsmith_home_env: Option<&str>) -> Option<PathBuf> {
    match songsmith_home_env {
        Some(val) => Some(PathBuf::from(val)),
        None => home_dir().map(|home| home.join(".songsmith")),
    }
}

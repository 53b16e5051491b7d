// 🔧 Application configuration
// college-finder.toml, or --config / COLLEGE_FINDER_CONFIG. Flags override the
// file, the file overrides defaults. A missing file is not an error.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "college-finder.toml";

/// Top-level config, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// `[catalog]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Spreadsheet to load at startup; the built-in list when unset.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file holding document metadata.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Directory where uploaded blobs are written.
    #[serde(default = "default_blob_dir")]
    pub blob_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            blob_dir: default_blob_dir(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("college-finder.db")
}
fn default_blob_dir() -> PathBuf {
    PathBuf::from("documents")
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

fn default_addr() -> String {
    "0.0.0.0:3000".into()
}

/// `[auth]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of one-time verification codes.
    #[serde(default = "default_otp_ttl")]
    pub otp_ttl_secs: u64,

    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            otp_ttl_secs: default_otp_ttl(),
            min_password_len: default_min_password_len(),
        }
    }
}

fn default_otp_ttl() -> u64 {
    300
}
fn default_min_password_len() -> usize {
    crate::validation::MIN_PASSWORD_LEN
}

impl AppConfig {
    /// Parse config from TOML text.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load config from `path`, falling back to defaults when it does not exist.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AppConfig::default());
    }

    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = AppConfig::from_toml(&text, &path)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

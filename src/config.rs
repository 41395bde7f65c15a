/// Runtime configuration
///
/// Everything is read from the environment (optionally seeded from a `.env`
/// file next to the binary), so the same build can talk to any backend.
use std::path::PathBuf;

use reqwest::Url;
use thiserror::Error;

/// Base URL used when `PHOTO_SHARE_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

const API_URL_VAR: &str = "PHOTO_SHARE_API_URL";
const DATA_DIR_VAR: &str = "PHOTO_SHARE_DATA_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API base URL {url:?}: {reason}")]
    InvalidApiUrl { url: String, reason: String },
    #[error("could not determine a data directory for the session store")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL every endpoint is built from, without a trailing slash
    pub api_url: String,
    /// Directory holding `session.db`
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url =
            std::env::var(API_URL_VAR).unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let data_dir = match std::env::var_os(DATA_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        Self::new(&api_url, data_dir)
    }

    /// Build a configuration from explicit values, validating the URL.
    pub fn new(api_url: &str, data_dir: PathBuf) -> Result<Self, ConfigError> {
        let api_url = normalize_api_url(api_url)?;
        Ok(Config { api_url, data_dir })
    }

    /// Path of the SQLite file backing the session store
    pub fn session_db_path(&self) -> PathBuf {
        self.data_dir.join("session.db")
    }
}

/// Same layout as other desktop apps:
/// - Linux: ~/.local/share/photo-share
/// - macOS: ~/Library/Application Support/photo-share
/// - Windows: %APPDATA%\photo-share
fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .ok_or(ConfigError::NoDataDir)?;

    path.push("photo-share");
    Ok(path)
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');

    Url::parse(trimmed).map_err(|e| ConfigError::InvalidApiUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    Ok(trimmed.to_string())
}

//! Config file parsing for `~/.config/shelfwise/config.toml`.
//!
//! Provider endpoints, credentials and placeholder patterns belong to the
//! hosting application; build a resolver from them with
//! [`CoverResolver::from_config`](crate::cover::CoverResolver::from_config).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::lookup::{google_books, openlibrary};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub covers: CoverConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverConfig {
    #[serde(default = "default_google_books_url")]
    pub google_books_url: String,
    pub google_books_api_key: Option<String>,
    #[serde(default = "default_open_library_url")]
    pub open_library_url: String,
    #[serde(default = "default_open_library_covers_url")]
    pub open_library_covers_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Unset leaves the HTTP client's own defaults in charge.
    pub request_timeout_secs: Option<u64>,
    /// Substrings that mark a caller's cover URL as a stand-in image.
    #[serde(default = "default_placeholder_patterns")]
    pub placeholder_patterns: Vec<String>,
    #[serde(default = "default_prefetch_concurrency")]
    pub prefetch_concurrency: usize,
}

fn default_google_books_url() -> String {
    google_books::DEFAULT_BASE_URL.to_string()
}
fn default_open_library_url() -> String {
    openlibrary::DEFAULT_SEARCH_URL.to_string()
}
fn default_open_library_covers_url() -> String {
    openlibrary::DEFAULT_COVERS_URL.to_string()
}
fn default_user_agent() -> String {
    concat!("shelfwise/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_placeholder_patterns() -> Vec<String> {
    [
        "picsum.photos",
        "placehold.co",
        "placehold.it",
        "placeholder.com",
        "via.placeholder",
        "dummyimage.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_prefetch_concurrency() -> usize {
    8
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            google_books_url: default_google_books_url(),
            google_books_api_key: None,
            open_library_url: default_open_library_url(),
            open_library_covers_url: default_open_library_covers_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: None,
            placeholder_patterns: default_placeholder_patterns(),
            prefetch_concurrency: default_prefetch_concurrency(),
        }
    }
}

/// Return the default config file path (for init and show).
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut p| {
        p.push("shelfwise");
        p.push("config.toml");
        p
    })
}

/// Load config from the default path. A missing or unreadable file yields defaults.
pub fn load_config() -> AppConfig {
    let Some(path) = config_path() else {
        return AppConfig::default();
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match load_config_from(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("Ignoring config at {}: {}", path.display(), e);
            AppConfig::default()
        }
    }
}

pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

pub fn save_config(path: &Path, cfg: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

/// Set a dot-separated key (e.g. `covers.prefetch_concurrency`).
pub fn set_config_key(cfg: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };
    let parts: Vec<&str> = key.splitn(2, '.').collect();
    match parts.as_slice() {
        ["covers", sub] => match *sub {
            "google_books_url" => cfg.covers.google_books_url = value.to_string(),
            "google_books_api_key" => {
                cfg.covers.google_books_api_key = Some(value.to_string()).filter(|v| !v.is_empty())
            }
            "open_library_url" => cfg.covers.open_library_url = value.to_string(),
            "open_library_covers_url" => cfg.covers.open_library_covers_url = value.to_string(),
            "user_agent" => cfg.covers.user_agent = value.to_string(),
            "request_timeout_secs" => {
                cfg.covers.request_timeout_secs = if value.is_empty() {
                    None
                } else {
                    Some(value.parse().map_err(|_| invalid())?)
                }
            }
            "placeholder_patterns" => {
                cfg.covers.placeholder_patterns = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            }
            "prefetch_concurrency" => {
                let n: usize = value.parse().map_err(|_| invalid())?;
                if n == 0 {
                    return Err(invalid());
                }
                cfg.covers.prefetch_concurrency = n;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        },
        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    }
    Ok(())
}

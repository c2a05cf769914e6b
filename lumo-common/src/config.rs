//! Configuration loading and resolution
//!
//! Resolution follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not fatal: the tool starts with defaults and a
//! warning. Commands that need the remote store fail later, with a pointer to
//! the missing keys, when the store client is actually constructed.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the TOML config file.
pub const ENV_CONFIG: &str = "LUMO_CONFIG";
/// Environment variable naming the shop database file.
pub const ENV_DATABASE: &str = "LUMO_DATABASE";
/// Environment override for the media-store API key.
pub const ENV_STORE_KEY: &str = "LUMO_STORE_API_KEY";
/// Environment override for the media-store API secret.
pub const ENV_STORE_SECRET: &str = "LUMO_STORE_API_SECRET";

/// Top-level TOML configuration (`~/.config/lumo/sweep.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to the shop SQLite database
    pub database_path: Option<String>,

    /// Root of the shop's public directory (source of legacy local images
    /// for the migration command)
    pub public_dir: Option<String>,

    /// Remote media-store connection
    #[serde(default)]
    pub store: StoreSection,

    /// Cleanup pacing
    #[serde(default)]
    pub cleanup: CleanupSection,
}

/// `[store]` section of the TOML config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSection {
    pub base_url: Option<String>,
    pub space: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Folder prefix that namespaces every shop asset (default "shop")
    pub folder: Option<String>,
    /// Per-request timeout in seconds (default 20)
    pub timeout_secs: Option<u64>,
    /// Listing page size (default 500)
    pub page_size: Option<u32>,
}

/// `[cleanup]` section of the TOML config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupSection {
    /// Fixed delay between consecutive delete calls, in milliseconds
    /// (default 500)
    pub delete_delay_ms: Option<u64>,
}

impl TomlConfig {
    /// Load configuration with the standard priority order.
    ///
    /// `cli_path` wins over `LUMO_CONFIG`, which wins over the platform
    /// config directory. A missing file yields defaults plus a warning; an
    /// unreadable or malformed file is an error (misconfiguration should not
    /// be silently ignored).
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = match cli_path {
            Some(p) => Some(p.to_path_buf()),
            None => match std::env::var(ENV_CONFIG) {
                Ok(p) if !p.trim().is_empty() => Some(PathBuf::from(p)),
                _ => default_config_path(),
            },
        };

        let Some(path) = path else {
            warn!("No config file location could be determined, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Resolve the shop database path: CLI > env > TOML > platform default.
    pub fn resolve_database_path(&self, cli_arg: Option<&Path>) -> PathBuf {
        if let Some(p) = cli_arg {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var(ENV_DATABASE) {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        if let Some(p) = &self.database_path {
            return PathBuf::from(p);
        }
        default_database_path()
    }
}

/// Default config file path (`<config dir>/lumo/sweep.toml`)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lumo").join("sweep.toml"))
}

/// OS-dependent default database location (`<data dir>/lumo/lumo.db`)
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lumo").join("lumo.db"))
        .unwrap_or_else(|| PathBuf::from("./lumo.db"))
}

/// Remote media-store connection settings.
///
/// Constructed once and passed explicitly into every component that talks to
/// the store; there is no ambient client state.
#[derive(Debug, Clone)]
pub struct MediaStoreConfig {
    pub base_url: String,
    pub space: String,
    pub api_key: String,
    pub api_secret: String,
    /// Folder prefix namespacing every shop asset
    pub folder: String,
    pub timeout_secs: u64,
    pub page_size: u32,
}

impl MediaStoreConfig {
    /// Build store settings from the `[store]` TOML section plus environment
    /// overrides (`LUMO_STORE_API_KEY` / `LUMO_STORE_API_SECRET`).
    ///
    /// Credentials found in multiple sources log a warning; the environment
    /// wins (it is the operational override channel).
    pub fn from_toml(section: &StoreSection) -> Result<Self> {
        let base_url = section
            .base_url
            .clone()
            .ok_or_else(|| Error::Config("store.base_url is not configured".to_string()))?;
        let space = section
            .space
            .clone()
            .ok_or_else(|| Error::Config("store.space is not configured".to_string()))?;

        let env_key = std::env::var(ENV_STORE_KEY).ok().filter(|k| !k.trim().is_empty());
        let env_secret = std::env::var(ENV_STORE_SECRET)
            .ok()
            .filter(|k| !k.trim().is_empty());

        if env_key.is_some() && section.api_key.is_some() {
            warn!("Store API key found in both environment and TOML; using environment");
        }
        if env_secret.is_some() && section.api_secret.is_some() {
            warn!("Store API secret found in both environment and TOML; using environment");
        }

        let api_key = env_key
            .or_else(|| section.api_key.clone())
            .ok_or_else(|| {
                Error::Config(format!(
                    "Store API key not configured ({} or store.api_key)",
                    ENV_STORE_KEY
                ))
            })?;
        let api_secret = env_secret
            .or_else(|| section.api_secret.clone())
            .ok_or_else(|| {
                Error::Config(format!(
                    "Store API secret not configured ({} or store.api_secret)",
                    ENV_STORE_SECRET
                ))
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            space,
            api_key,
            api_secret,
            folder: section.folder.clone().unwrap_or_else(|| "shop".to_string()),
            timeout_secs: section.timeout_secs.unwrap_or(20),
            page_size: section.page_size.unwrap_or(500),
        })
    }
}

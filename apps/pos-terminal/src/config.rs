//! # Terminal Configuration
//!
//! Settings for one counter terminal: where the backend lives, which branch
//! sells, and where receipts go.
//!
//! ## Configuration Priority
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority (highest first)               │
//! │                                                                         │
//! │  1. Command-line flags       (--backend-url, --branch-id, ...)          │
//! │  2. Environment variables    (FARMA_BACKEND_URL, FARMA_BRANCH_ID, ...)  │
//! │  3. Config file              (terminal.toml)                            │
//! │  4. Defaults                 (this file)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example terminal.toml
//! ```toml
//! [backend]
//! base_url = "http://192.168.1.10:5000"
//! timeout_secs = 15
//! search_limit = 200
//!
//! [store]
//! name = "Farmacia Central"
//! branch_id = 1
//!
//! [receipts]
//! dir = "/var/lib/farma/receipts"
//! open_in_browser = true
//! ```

use std::path::PathBuf;
use std::time::Duration;

use farma_api::client::{DEFAULT_BASE_URL, DEFAULT_SEARCH_LIMIT, DEFAULT_TIMEOUT};
use farma_api::ClientConfig;
use farma_core::cart::DEFAULT_BRANCH_ID;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const CONFIG_FILE_NAME: &str = "terminal.toml";

// =============================================================================
// Errors
// =============================================================================

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid terminal configuration: {0}")]
    Invalid(String),

    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Backend address, with or without a trailing `/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound sent with product searches.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_search_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            search_limit: default_search_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Printed above the HTML receipt. Empty prints nothing.
    #[serde(default)]
    pub name: String,

    /// Sent as `id_sucursal` with every invoice.
    #[serde(default = "default_branch_id")]
    pub branch_id: i64,
}

fn default_branch_id() -> i64 {
    DEFAULT_BRANCH_ID
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            branch_id: default_branch_id(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptSettings {
    /// Where receipt files are written. Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Open the HTML receipt in the system browser after each sale.
    #[serde(default)]
    pub open_in_browser: bool,
}

/// Flags that override everything else.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backend_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub branch_id: Option<i64>,
    pub store_name: Option<String>,
    pub receipts_dir: Option<PathBuf>,
    pub open_receipts: bool,
}

// =============================================================================
// Terminal Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub receipts: ReceiptSettings,
}

impl TerminalConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (terminal.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Terminal config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let url = farma_api::normalize_base_url(&self.backend.base_url);
        if self.backend.base_url.trim().is_empty() || url::Url::parse(&url).is_err() {
            return Err(ConfigError::Invalid(format!(
                "backend.base_url is not a valid URL: {:?}",
                self.backend.base_url
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "backend.timeout_secs must be greater than 0".into(),
            ));
        }

        if self.backend.search_limit == 0 {
            return Err(ConfigError::Invalid(
                "backend.search_limit must be greater than 0".into(),
            ));
        }

        if self.store.branch_id <= 0 {
            return Err(ConfigError::Invalid(
                "store.branch_id must be a positive id".into(),
            ));
        }

        Ok(())
    }

    /// Applies command-line flags, then re-validates.
    pub fn apply_cli(&mut self, cli: CliOverrides) -> ConfigResult<()> {
        if let Some(url) = cli.backend_url {
            self.backend.base_url = url;
        }
        if let Some(secs) = cli.timeout_secs {
            self.backend.timeout_secs = secs;
        }
        if let Some(id) = cli.branch_id {
            self.store.branch_id = id;
        }
        if let Some(name) = cli.store_name {
            self.store.name = name;
        }
        if let Some(dir) = cli.receipts_dir {
            self.receipts.dir = Some(dir);
        }
        if cli.open_receipts {
            self.receipts.open_in_browser = true;
        }
        self.validate()
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("FARMA_BACKEND_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.backend.base_url = url;
        }

        if let Some(secs) = var("FARMA_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.backend.timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid FARMA_TIMEOUT_SECS"),
            }
        }

        if let Some(limit) = var("FARMA_SEARCH_LIMIT") {
            match limit.parse::<u32>() {
                Ok(l) => self.backend.search_limit = l,
                Err(_) => warn!(value = %limit, "Ignoring invalid FARMA_SEARCH_LIMIT"),
            }
        }

        if let Some(id) = var("FARMA_BRANCH_ID") {
            match id.parse::<i64>() {
                Ok(b) => self.store.branch_id = b,
                Err(_) => warn!(value = %id, "Ignoring invalid FARMA_BRANCH_ID"),
            }
        }

        if let Some(name) = var("FARMA_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(dir) = var("FARMA_RECEIPTS_DIR") {
            self.receipts.dir = Some(PathBuf::from(dir));
        }

        if let Some(open) = var("FARMA_OPEN_RECEIPTS") {
            match open.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.receipts.open_in_browser = true,
                "0" | "false" | "no" => self.receipts.open_in_browser = false,
                _ => warn!(value = %open, "Unknown FARMA_OPEN_RECEIPTS value"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "farma", "pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Settings for the backend client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.backend.base_url.clone(),
            timeout: Duration::from_secs(self.backend.timeout_secs),
            search_limit: self.backend.search_limit,
        }
    }

    /// Receipt directory: configured, else `<data dir>/receipts`, else
    /// `./receipts`.
    pub fn receipts_dir(&self) -> PathBuf {
        self.receipts.dir.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("com", "farma", "pos")
                .map(|dirs| dirs.data_dir().join("receipts"))
                .unwrap_or_else(|| PathBuf::from("receipts"))
        })
    }
}

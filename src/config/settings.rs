//! Application settings loaded from `config.toml`.
//!
//! Every section and key has a default, so an absent file or a partial file is
//! fine. The database location is not part of this file; it comes from
//! `DATABASE_URL` (see [`crate::config::database`]).

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// API behaviour (pagination)
    pub api: ApiConfig,
    /// Catalog bootstrap settings
    pub catalog: CatalogConfig,
    /// Order service policies
    pub orders: OrderConfig,
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
        }
    }
}

/// `[api]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Page size used when the request does not ask for one
    pub page_size: u64,
    /// Upper bound for a requested `page_size`
    pub max_page_size: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            max_page_size: 100,
        }
    }
}

/// `[catalog]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// CSV file read by `init-db`
    pub csv_path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data/dataset.csv"),
        }
    }
}

/// How an order's amount reacts to a line update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountPolicy {
    /// Add `price * new quantity` to the current amount, leaving the old
    /// contribution of the line in place
    #[default]
    Additive,
    /// Replace the amount with the sum over all current lines
    Recompute,
}

/// What order creation does with lines that could not be stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineFailurePolicy {
    /// Keep the order with the lines that were stored
    #[default]
    #[serde(rename = "skip")]
    SkipFailedLines,
    /// Roll the whole order back
    #[serde(rename = "reject")]
    RejectOrder,
}

/// `[orders]` section
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Applied by the order line update service
    pub amount_policy: AmountPolicy,
    /// Applied by the order creation service
    pub line_failure_policy: LineFailurePolicy,
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or its TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `path`, falling back to defaults when the file does not exist.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    if path_ref.exists() {
        load_config(path_ref)
    } else {
        info!(
            "No config file at {}, using default settings.",
            path_ref.display()
        );
        Ok(AppConfig::default())
    }
}

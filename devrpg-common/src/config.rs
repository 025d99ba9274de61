//! Configuration file loading and setting resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! clap merges 1 and 2 (`#[arg(env = ...)]`); this module supplies 3 and the
//! merge with 4. A missing config file is never fatal.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Directory name under the platform config dir
const APP_DIR: &str = "devrpg";
const CONFIG_FILE: &str = "config.toml";

/// Contents of `config.toml`
///
/// Every field is optional; absent fields fall through to compiled defaults.
/// One file serves the gateway and every backend, each reading its own keys.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Gateway bind address, e.g. `0.0.0.0:3210`
    pub bind: Option<String>,
    /// sqlx database URL
    pub database_url: Option<String>,
    /// Gateway connection pool bounds
    pub pool: PoolConfig,
    /// Fan-out timeout per backend, seconds
    pub analysis_timeout_secs: Option<u64>,
    /// Backend base URLs
    pub services: ServiceUrls,
    /// Workflow engine base URL (CI webhook forwarding)
    pub workflow_url: Option<String>,
    /// Analysis backend settings
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub min_connections: Option<u32>,
    pub max_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceUrls {
    pub lighthouse: Option<String>,
    pub code_quality: Option<String>,
    pub architect: Option<String>,
    pub event_loop: Option<String>,
    pub cost: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `groq` or `ollama`
    pub provider: Option<String>,
    pub groq_api_url: Option<String>,
    pub groq_model: Option<String>,
    pub ollama_url: Option<String>,
    pub ollama_model: Option<String>,
    pub lighthouse_bin: Option<String>,
}

/// Load the TOML configuration
///
/// An explicit path must exist and parse. Without one, the first existing
/// default location is used; when none exists the defaults are returned with
/// a warning.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_paths().into_iter().find(|p| p.exists()) {
            Some(path) => path,
            None => {
                warn!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parse `config.toml` content
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

/// Candidate config file locations, in lookup order
///
/// `~/.config/devrpg/config.toml` (platform config dir), then on Unix
/// `/etc/devrpg/config.toml`.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(APP_DIR).join(CONFIG_FILE));
    }
    if cfg!(unix) {
        paths.push(PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE));
    }
    paths
}

/// Pick the first configured value: CLI/env, then TOML, then `default`
pub fn resolve_setting<T>(primary: Option<T>, toml: Option<T>, default: T) -> T {
    primary.or(toml).unwrap_or(default)
}

/// Like [`resolve_setting`] for string settings with a `&str` default
pub fn resolve_string(primary: Option<String>, toml: Option<&String>, default: &str) -> String {
    primary
        .or_else(|| toml.cloned())
        .unwrap_or_else(|| default.to_string())
}

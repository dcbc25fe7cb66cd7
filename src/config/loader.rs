//! Configuration loading and discovery for `sitesmith.toml`
//!
//! Finds the config by walking up from the working directory; a missing file
//! is not an error, it just yields the defaults.

use super::schema::SiteConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "sitesmith.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse sitesmith.toml: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Find `sitesmith.toml` by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find `sitesmith.toml` by walking up from a specific directory.
///
/// Split out from [`find_config`] so tests can pick their own start point.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load config from the given path, or the defaults when `None`.
pub fn load_config(path: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    match path {
        Some(p) => {
            let content = fs::read_to_string(p)?;
            let config: SiteConfig = toml::from_str(&content)?;
            Ok(config)
        }
        None => Ok(default_config()),
    }
}

/// The built-in default configuration (conventional `src/` -> `dist/` layout).
pub fn default_config() -> SiteConfig {
    SiteConfig::default()
}

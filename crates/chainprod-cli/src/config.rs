//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use chainprod_core::ClientConfig;

use crate::cli::{ConfigKey, HostArgs, OutputFormat};

/// Host used when neither flag, env var nor config file names one.
pub const DEFAULT_URL: &str = "http://localhost:5000";

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Printer host URL
    #[serde(default)]
    pub url: Option<String>,

    /// API key for the printer host
    #[serde(default)]
    pub api_key: Option<String>,

    /// Plugin identity of the controller
    #[serde(default)]
    pub plugin_id: Option<String>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Default output format
    #[serde(default)]
    pub format: Option<String>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chainprod")
            .join("config.toml")
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`, or return default if missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Set one key from its string form
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        match key {
            ConfigKey::Url => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    bail!("url must start with http:// or https://");
                }
                self.url = Some(value.to_string());
            }
            ConfigKey::ApiKey => self.api_key = Some(value.to_string()),
            ConfigKey::PluginId => self.plugin_id = Some(value.to_string()),
            ConfigKey::Timeout => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("'{}' is not a valid number of seconds", value))?;
                if secs == 0 {
                    bail!("timeout must be > 0");
                }
                self.timeout = Some(secs);
            }
            ConfigKey::Format => {
                parse_format(value)?;
                self.format = Some(value.to_lowercase());
            }
            ConfigKey::NoColor => {
                self.no_color = crate::cli::parse_switch(value).map_err(anyhow::Error::msg)?;
            }
        }
        Ok(())
    }

    /// Remove one key
    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::Url => self.url = None,
            ConfigKey::ApiKey => self.api_key = None,
            ConfigKey::PluginId => self.plugin_id = None,
            ConfigKey::Timeout => self.timeout = None,
            ConfigKey::Format => self.format = None,
            ConfigKey::NoColor => self.no_color = false,
        }
    }
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    match value.to_lowercase().as_str() {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        _ => bail!("Invalid format '{}'. Valid values: text, json", value),
    }
}

/// Resolve the output format: `--json` flag, then config, then text
pub fn resolve_format(json: bool, config: &Config) -> OutputFormat {
    if json {
        return OutputFormat::Json;
    }
    config
        .format
        .as_deref()
        .and_then(|f| parse_format(f).ok())
        .unwrap_or_default()
}

/// Build the client config: flag or env var, then config file, then default
pub fn resolve_client_config(host: &HostArgs, config: &Config) -> ClientConfig {
    let url = host
        .url
        .clone()
        .or_else(|| config.url.clone())
        .unwrap_or_else(|| DEFAULT_URL.to_string());

    let mut builder = ClientConfig::builder(url)
        .maybe_api_key(host.api_key.clone().or_else(|| config.api_key.clone()));

    if let Some(plugin_id) = host.plugin_id.clone().or_else(|| config.plugin_id.clone()) {
        builder = builder.plugin_id(plugin_id);
    }
    if let Some(secs) = host.timeout.or(config.timeout) {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    builder.build()
}

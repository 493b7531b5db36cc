//! Client configuration.
//!
//! Use the builder for convenient configuration:
//!
//! ```
//! use std::time::Duration;
//! use chainprod_core::ClientConfig;
//!
//! let config = ClientConfig::builder("http://octopi.local")
//!     .api_key("ABCDEF")
//!     .request_timeout(Duration::from_secs(5))
//!     .build();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.plugin_id, "prusa_chain_production");
//! ```

use std::time::Duration;

use chainprod_types::DEFAULT_PLUGIN_ID;

use crate::error::{Error, Result};

/// Configuration for a [`crate::ChainClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the printer host (e.g. `http://octopi.local`).
    pub base_url: String,
    /// Identity the controller plugin is registered under.
    ///
    /// Selects the API path and filters push notifications.
    /// Default: `prusa_chain_production`.
    pub plugin_id: String,
    /// API key sent as `X-Api-Key`, if the host requires one.
    pub api_key: Option<String>,
    /// Per-request timeout.
    /// Default: 10 seconds.
    pub request_timeout: Duration,
    /// Countdown tick period.
    /// Default: 1 second.
    pub tick_interval: Duration,
    /// Capacity of the event broadcast channel.
    /// Default: 100 events.
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            plugin_id: DEFAULT_PLUGIN_ID.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(10),
            tick_interval: Duration::from_secs(1),
            event_capacity: 100,
        }
    }
}

impl ClientConfig {
    /// Create a config for the given host with defaults for everything else.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Create a new builder.
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::new(base_url),
        }
    }

    /// Validate the config and return an error if invalid.
    ///
    /// Checks that:
    /// - `base_url` starts with `http://` or `https://`
    /// - `plugin_id` is non-empty and has no `/`
    /// - `request_timeout` and `tick_interval` are > 0
    /// - `event_capacity` is > 0
    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::invalid_config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.plugin_id.is_empty() || self.plugin_id.contains('/') {
            return Err(Error::invalid_config(
                "plugin_id must be non-empty and must not contain '/'",
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::invalid_config("request_timeout must be > 0"));
        }
        if self.tick_interval.is_zero() {
            return Err(Error::invalid_config("tick_interval must be > 0"));
        }
        if self.event_capacity == 0 {
            return Err(Error::invalid_config("event_capacity must be > 0"));
        }
        Ok(())
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the plugin identity.
    #[must_use]
    pub fn plugin_id(mut self, plugin_id: impl Into<String>) -> Self {
        self.config.plugin_id = plugin_id.into();
        self
    }

    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set the API key if one is given.
    #[must_use]
    pub fn maybe_api_key(mut self, key: Option<String>) -> Self {
        self.config.api_key = key;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the countdown tick period.
    #[must_use]
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick_interval = interval;
        self
    }

    /// Set the event channel capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Build the config.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

//! HTTP transport for the chain production plugin API.
//!
//! The controller is exposed by the printer host as a simple plugin API:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | Fetch status | `GET {base_url}/api/plugin/{plugin_id}` |
//! | Send command | `POST {base_url}/api/plugin/{plugin_id}` with `{"command": ..., ...params}` |
//!
//! When an API key is configured it is sent as the `X-Api-Key` header.
//!
//! # Example
//!
//! ```no_run
//! use chainprod_core::{ChainTransport, ClientConfig, HttpTransport};
//! use chainprod_types::Command;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(&ClientConfig::new("http://octopi.local"))?;
//!
//! let status = transport.fetch_status().await?;
//! println!("Ejecting: {:?}", status.ejecting);
//!
//! transport.send_command(&Command::set_fan(true)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use chainprod_types::{Command, DeviceStatus};

use crate::config::ClientConfig;
use crate::error::{SyncError, TransportError};
use crate::traits::ChainTransport;

/// Header carrying the host API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// HTTP transport for the controller plugin API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: Option<HeaderValue>,
}

impl HttpTransport {
    /// Create a new transport from a client config.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(TransportError::Request)?;

        Self::with_client(config, client)
    }

    /// Create a transport with a custom reqwest Client.
    pub fn with_client(config: &ClientConfig, client: Client) -> Result<Self, TransportError> {
        let endpoint = plugin_endpoint(&config.base_url, &config.plugin_id)?;

        let api_key = match &config.api_key {
            Some(key) => Some(HeaderValue::from_str(key).map_err(|_| {
                TransportError::InvalidApiKey(
                    "contains characters not allowed in a header".to_string(),
                )
            })?),
            None => None,
        };

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Get the plugin endpoint URL.
    pub fn url(&self) -> &str {
        &self.endpoint
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            headers.insert(API_KEY_HEADER, key.clone());
        }
        headers
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, TransportError> {
        let response = request.headers(self.headers()).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                TransportError::NotReachable {
                    url: self.endpoint.clone(),
                    source: e,
                }
            } else {
                TransportError::Request(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or_else(|| status.to_string());

            Err(TransportError::ApiError {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl ChainTransport for HttpTransport {
    async fn fetch_status(&self) -> Result<DeviceStatus, SyncError> {
        let response = self.execute(self.client.get(&self.endpoint)).await?;
        let body = response.text().await.map_err(TransportError::Request)?;
        debug!(bytes = body.len(), "Status response received");
        Ok(DeviceStatus::from_json(&body)?)
    }

    async fn send_command(&self, command: &Command) -> Result<(), TransportError> {
        self.execute(self.client.post(&self.endpoint).json(command))
            .await?;
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Build the plugin API URL from a host base URL and plugin identity.
///
/// A trailing slash on the base URL is ignored.
///
/// ```
/// use chainprod_core::http::plugin_endpoint;
///
/// let url = plugin_endpoint("http://octopi.local/", "prusa_chain_production").unwrap();
/// assert_eq!(url, "http://octopi.local/api/plugin/prusa_chain_production");
/// ```
pub fn plugin_endpoint(base_url: &str, plugin_id: &str) -> Result<String, TransportError> {
    let base_url = base_url.trim_end_matches('/');

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(TransportError::InvalidUrl(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }
    if plugin_id.is_empty() {
        return Err(TransportError::InvalidUrl(
            "plugin id must not be empty".to_string(),
        ));
    }

    Ok(format!("{}/api/plugin/{}", base_url, plugin_id))
}

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use strum::{AsRefStr, Display};

use crate::error::{LinkError, LinkResult};

/// API root used when no other base URL is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Service endpoints, relative to the configured base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
pub enum Endpoint {
    /// Creates a new link request.
    #[strum(serialize = "/service/link/create")]
    CreateLinkRequest,
    /// Serves the QR code image of a link request.
    #[strum(serialize = "/service/link/qr")]
    LinkRequestQrCode,
    /// Reports the status of a link request.
    #[strum(serialize = "/service/link/status")]
    LinkRequestStatus,
    /// Deletes a link request.
    #[strum(serialize = "/service/link/clear")]
    ClearLinkRequest,
    /// Reports the username and balance of a linked user.
    #[strum(serialize = "/service/user_info")]
    UserInfo,
    /// Deducts a purchase from a linked user's balance.
    #[strum(serialize = "/service/purchase")]
    Purchase,
}

/// Connection settings for the Fitcoin service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    base_url: String,
    timeout: Option<Duration>,
}

#[derive(Deserialize)]
struct RawServiceConfig {
    base_url: String,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

impl ServiceConfig {
    /// Creates a config pointing at `base_url` (e.g. `https://fitcoin.example/api`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    /// Bounds every HTTP exchange made through the default transport.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Parses a config from JSON, e.g. `{"base_url": "https://fitcoin.example/api", "timeout_ms": 3000}`.
    ///
    /// # Errors
    /// Returns [`LinkError::InvalidConfig`] if the JSON is invalid or the base URL cannot be parsed.
    pub fn from_json(json: &str) -> LinkResult<Self> {
        let raw: RawServiceConfig = serde_json::from_str(json)
            .map_err(|e| LinkError::InvalidConfig(format!("invalid config json: {e}")))?;

        Url::parse(&raw.base_url).map_err(|e| {
            LinkError::InvalidConfig(format!("invalid base_url {}: {e}", raw.base_url))
        })?;

        let config = Self::new(raw.base_url);
        Ok(match raw.timeout_ms {
            Some(ms) => config.with_timeout(Duration::from_millis(ms)),
            None => config,
        })
    }

    /// The API root every endpoint is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-exchange timeout, if one is configured.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Builds the full URL for `endpoint` with percent-encoded `query` parameters.
    ///
    /// # Errors
    /// Returns [`LinkError::InvalidUrl`] if the base URL is not a valid URL.
    pub fn endpoint_url(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
    ) -> LinkResult<String> {
        let raw = format!("{}{}", self.base_url, endpoint.as_ref());
        let url = if query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, query)
        }
        .map_err(|e| LinkError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        Ok(url.into())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

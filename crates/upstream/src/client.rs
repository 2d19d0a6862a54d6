//! HTTP client for the profile and player-statistics endpoints.
//!
//! Wraps [`reqwest`] with bounded connect and request timeouts. Every call
//! returns the raw status and body; interpreting them is the caller's job.

use std::time::Duration;

use playercache_core::types::PlayerId;
use reqwest::header::HeaderMap;

/// Header carrying the upstream credential.
pub const API_KEY_HEADER: &str = "API-Key";

/// Requests left in the current rate-limit window.
pub const RATE_LIMIT_REMAINING_HEADER: &str = "RateLimit-Remaining";

/// Seconds until the rate-limit window resets.
pub const RATE_LIMIT_RESET_HEADER: &str = "RateLimit-Reset";

pub const DEFAULT_API_BASE_URL: &str = "https://api.hypixel.net";
pub const DEFAULT_PROFILE_BASE_URL: &str = "https://api.ashcon.app/mojang/v2";

/// Errors below the HTTP status level.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Timeout, DNS, TLS, connection reset, or an unreadable body.
    #[error("Upstream transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Rate-limit headers reported by the upstream, when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimit {
    pub remaining: Option<u32>,
    pub reset_secs: Option<u64>,
}

impl RateLimit {
    /// Read the rate-limit headers, ignoring missing or unparseable values.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn parse<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        }

        Self {
            remaining: parse(headers, RATE_LIMIT_REMAINING_HEADER),
            reset_secs: parse(headers, RATE_LIMIT_RESET_HEADER),
        }
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
    pub rate_limit: RateLimit,
}

/// Endpoints, credential and timeouts for [`UpstreamClient`].
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Player-statistics API base, e.g. `https://api.hypixel.net`.
    pub api_base_url: String,
    /// Name-resolution API base; `/user/{id}` is appended.
    pub profile_base_url: String,
    /// Upstream credential. `None` is a valid, handled state.
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            profile_base_url: DEFAULT_PROFILE_BASE_URL.to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the upstream APIs.
pub struct UpstreamClient {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(concat!("playercache/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// `GET {profile_base}/user/{id}` -- resolves the display name.
    pub async fn fetch_profile(&self, id: &PlayerId) -> Result<UpstreamResponse, UpstreamError> {
        let url = format!(
            "{}/user/{}",
            self.config.profile_base_url.trim_end_matches('/'),
            id
        );
        let response = self.client.get(url).send().await?;
        Self::read_response(response).await
    }

    /// `GET {api_base}/v2/player?uuid={id}` with the `API-Key` header.
    pub async fn fetch_player(
        &self,
        id: &PlayerId,
        api_key: &str,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = format!(
            "{}/v2/player",
            self.config.api_base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .get(url)
            .query(&[("uuid", id.key())])
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;
        Self::read_response(response).await
    }

    // ---- private helpers ----

    /// Capture status and rate-limit headers, then read the body as text.
    async fn read_response(response: reqwest::Response) -> Result<UpstreamResponse, UpstreamError> {
        let status = response.status().as_u16();
        let rate_limit = RateLimit::from_headers(response.headers());
        let body = response.text().await?;
        Ok(UpstreamResponse {
            status,
            body,
            rate_limit,
        })
    }
}

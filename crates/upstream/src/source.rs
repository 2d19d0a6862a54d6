//! Per-player fetch with an explicit outcome.
//!
//! [`HypixelSource`] resolves the display name first, then fetches the
//! statistics document. Each HTTP result is classified into a
//! [`FetchOutcome`] variant; the refresh worker matches on it instead of
//! inspecting status codes.

use std::time::Duration;

use async_trait::async_trait;
use playercache_core::types::PlayerId;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::client::{UpstreamClient, UpstreamResponse};

/// Result of one refresh attempt against the upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Statistics document for a resolved player.
    Success {
        name: Option<String>,
        fields: Map<String, Value>,
    },
    /// The player does not exist upstream.
    NotFound,
    /// HTTP 429. `reset_after` comes from the reset header when present.
    RateLimited { reset_after: Option<Duration> },
    /// Any other status, a transport failure, or an unusable body.
    Failed { status: Option<u16>, reason: String },
}

impl FetchOutcome {
    fn failed(status: Option<u16>, reason: impl Into<String>) -> Self {
        FetchOutcome::Failed {
            status,
            reason: reason.into(),
        }
    }

    fn rate_limited(response: &UpstreamResponse) -> Self {
        FetchOutcome::RateLimited {
            reset_after: response.rate_limit.reset_secs.map(Duration::from_secs),
        }
    }
}

/// Anything the refresh worker can ask for a player's document.
#[async_trait]
pub trait PlayerSource: Send + Sync {
    async fn fetch(&self, id: &PlayerId) -> FetchOutcome;
}

#[derive(Debug, Deserialize)]
struct ProfileBody {
    username: Option<String>,
}

/// Classify the name-resolution response.
///
/// `Ok(name)` means the lookup succeeded; `Err` carries the outcome that
/// ends this attempt.
pub fn classify_profile(response: &UpstreamResponse) -> Result<String, FetchOutcome> {
    match response.status {
        200 => match serde_json::from_str::<ProfileBody>(&response.body) {
            Ok(ProfileBody {
                username: Some(name),
            }) => Ok(name),
            Ok(_) => Err(FetchOutcome::failed(Some(200), "profile has no username")),
            Err(e) => Err(FetchOutcome::failed(
                Some(200),
                format!("profile body is not valid JSON: {e}"),
            )),
        },
        400 | 404 => Err(FetchOutcome::NotFound),
        429 => Err(FetchOutcome::rate_limited(response)),
        status => Err(FetchOutcome::failed(
            Some(status),
            format!("profile lookup returned HTTP {status}"),
        )),
    }
}

/// Classify the statistics response for a player whose name is known.
pub fn classify_stats(response: &UpstreamResponse, name: Option<String>) -> FetchOutcome {
    match response.status {
        200 => match serde_json::from_str::<Value>(&response.body) {
            Ok(Value::Object(fields)) => FetchOutcome::Success { name, fields },
            Ok(_) => FetchOutcome::failed(Some(200), "player body is not a JSON object"),
            Err(e) => FetchOutcome::failed(Some(200), format!("player body is not valid JSON: {e}")),
        },
        429 => FetchOutcome::rate_limited(response),
        status => FetchOutcome::failed(Some(status), format!("player API returned HTTP {status}")),
    }
}

/// Production [`PlayerSource`]: profile lookup, then statistics.
pub struct HypixelSource {
    client: UpstreamClient,
}

impl HypixelSource {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PlayerSource for HypixelSource {
    async fn fetch(&self, id: &PlayerId) -> FetchOutcome {
        let Some(api_key) = self.client.config().api_key.as_deref() else {
            return FetchOutcome::failed(None, "no API key configured");
        };

        let name = match self.client.fetch_profile(id).await {
            Ok(response) => match classify_profile(&response) {
                Ok(name) => name,
                Err(outcome) => return outcome,
            },
            Err(e) => {
                return FetchOutcome::failed(None, format!("profile lookup failed: {e}"));
            }
        };
        tracing::debug!(player_id = %id, name = %name, "Resolved player name");

        match self.client.fetch_player(id, api_key).await {
            Ok(response) => {
                if let Some(remaining) = response.rate_limit.remaining {
                    tracing::debug!(player_id = %id, remaining, "Upstream rate limit");
                }
                classify_stats(&response, Some(name))
            }
            Err(e) => FetchOutcome::failed(None, format!("player request failed: {e}")),
        }
    }
}

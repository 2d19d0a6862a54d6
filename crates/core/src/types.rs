use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Timestamps are stored as whole seconds since the Unix epoch.
pub type UnixSeconds = i64;

/// A validated player identifier.
///
/// Accepts every spelling the `uuid` crate parses (hyphenated, simple,
/// braced, `urn:uuid:`) and always renders as lowercase hyphenated hex,
/// which is the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Parse and canonicalize a raw identifier.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| CoreError::InvalidPlayerId(raw.to_string()))
    }

    /// Canonical cache key (lowercase, hyphenated).
    pub fn key(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for PlayerId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for PlayerId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl TryFrom<String> for PlayerId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlayerId> for String {
    fn from(value: PlayerId) -> Self {
        value.key()
    }
}

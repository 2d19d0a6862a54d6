//! Request extractors for the player endpoint.
//!
//! [`PlayerPath`] validates the identifier segment; [`RequestContext`] reads
//! the optional requester headers. Both reject before any store access, so a
//! malformed request never touches the cache or the refresh queue.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use playercache_core::types::PlayerId;

use crate::error::AppError;
use crate::state::AppState;

pub const REQUESTER_NAME_HEADER: &str = "x-requester-name";
pub const REQUESTER_ID_HEADER: &str = "x-requester-id";
pub const PROTOCOL_VERSION_HEADER: &str = "x-protocol-version";

/// The `{id}` path segment parsed as a [`PlayerId`]. Rejects with 400
/// "Invalid UUID format".
pub struct PlayerPath(pub PlayerId);

impl FromRequestParts<AppState> for PlayerPath {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::InvalidId)?;
        let id = PlayerId::parse(&raw).map_err(|_| AppError::InvalidId)?;
        Ok(PlayerPath(id))
    }
}

/// Who is asking, as reported by the client.
///
/// The values are carried into the refresh request for logging only; they
/// are never authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub requester_name: Option<String>,
    /// Always a canonical UUID when present.
    pub requester_id: Option<String>,
    pub protocol_version: Option<u32>,
}

impl RequestContext {
    /// Parse the requester headers. `None` means the request is incomplete.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let name = header_str(headers, REQUESTER_NAME_HEADER)?;
        let id = header_str(headers, REQUESTER_ID_HEADER)?;

        let (requester_name, requester_id) = match (name, id) {
            (None, None) => (None, None),
            (Some(name), Some(id)) => {
                let id = PlayerId::parse(id).ok()?;
                (Some(name.to_string()), Some(id.key()))
            }
            _ => return None,
        };

        let protocol_version = match header_str(headers, PROTOCOL_VERSION_HEADER)? {
            Some(raw) => Some(raw.parse().ok()?),
            None => None,
        };

        Some(Self {
            requester_name,
            requester_id,
            protocol_version,
        })
    }

    /// Whether this client may cause a refresh. Clients that do not announce
    /// a protocol version are always allowed.
    pub fn refresh_permitted(&self, min_protocol: u32) -> bool {
        self.protocol_version.is_none_or(|v| v >= min_protocol)
    }
}

/// `Some(None)` when absent, `None` when present but empty or not text.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<Option<&'a str>> {
    match headers.get(name) {
        None => Some(None),
        Some(value) => {
            let text = value.to_str().ok()?.trim();
            (!text.is_empty()).then_some(Some(text))
        }
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        RequestContext::from_headers(&parts.headers).ok_or(AppError::IncompleteRequest)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const REQUESTER: &str = "069a79f4-44e9-4726-a5be-fca90e38aaf5";

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn no_headers_is_anonymous() {
        let ctx = RequestContext::from_headers(&HeaderMap::new()).unwrap();
        assert_eq!(ctx, RequestContext::default());
        assert!(ctx.refresh_permitted(5));
    }

    #[test]
    fn full_pair_is_accepted_and_canonicalised() {
        let ctx = RequestContext::from_headers(&headers(&[
            (REQUESTER_NAME_HEADER, "Notch"),
            (REQUESTER_ID_HEADER, "069A79F444E94726A5BEFCA90E38AAF5"),
        ]))
        .unwrap();
        assert_eq!(ctx.requester_name.as_deref(), Some("Notch"));
        assert_eq!(ctx.requester_id.as_deref(), Some(REQUESTER));
    }

    #[test]
    fn lone_or_empty_requester_header_is_incomplete() {
        assert!(RequestContext::from_headers(&headers(&[(REQUESTER_NAME_HEADER, "Notch")])).is_none());
        assert!(RequestContext::from_headers(&headers(&[(REQUESTER_ID_HEADER, REQUESTER)])).is_none());
        assert!(RequestContext::from_headers(&headers(&[
            (REQUESTER_NAME_HEADER, " "),
            (REQUESTER_ID_HEADER, REQUESTER),
        ]))
        .is_none());
    }

    #[test]
    fn non_uuid_requester_id_is_incomplete() {
        assert!(RequestContext::from_headers(&headers(&[
            (REQUESTER_NAME_HEADER, "Notch"),
            (REQUESTER_ID_HEADER, "notch"),
        ]))
        .is_none());
    }

    #[test]
    fn non_utf8_header_is_incomplete() {
        let mut map = HeaderMap::new();
        map.insert(REQUESTER_NAME_HEADER, HeaderValue::from_bytes(b"\xffname").unwrap());
        map.insert(REQUESTER_ID_HEADER, HeaderValue::from_static(REQUESTER));
        assert!(RequestContext::from_headers(&map).is_none());
    }

    #[test]
    fn protocol_version_gates_refresh() {
        let ctx = RequestContext::from_headers(&headers(&[(PROTOCOL_VERSION_HEADER, "2")])).unwrap();
        assert_eq!(ctx.protocol_version, Some(2));
        assert!(ctx.refresh_permitted(0));
        assert!(ctx.refresh_permitted(2));
        assert!(!ctx.refresh_permitted(3));
    }

    #[test]
    fn unparseable_protocol_version_is_incomplete() {
        assert!(RequestContext::from_headers(&headers(&[(PROTOCOL_VERSION_HEADER, "v2")])).is_none());
        assert!(RequestContext::from_headers(&headers(&[(PROTOCOL_VERSION_HEADER, "-1")])).is_none());
    }
}

//! Handler for cached player lookups.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use playercache_core::types::PlayerId;
use playercache_worker::RefreshRequest;

use crate::error::{AppError, AppResult};
use crate::middleware::requester::{PlayerPath, RequestContext};
use crate::policy::{self, Answer, CacheState};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Player endpoint
// ---------------------------------------------------------------------------

/// GET /{id}
///
/// Serve the cached document for a player, stale or not, and queue a
/// background refresh when the entry is stale and refreshes are allowed.
/// Never waits on upstream.
pub async fn get_player(
    State(state): State<AppState>,
    PlayerPath(id): PlayerPath,
    ctx: RequestContext,
) -> AppResult<Response> {
    let lookup = state.store.get(&id).await?;
    let cache_state = CacheState::of(&lookup);

    let permitted =
        state.config.has_api_key() && ctx.refresh_permitted(state.config.min_refresh_protocol);
    let decision = policy::decide(cache_state, permitted);

    if decision.enqueue {
        enqueue_refresh(&state, id, &ctx);
    }

    match decision.answer {
        Answer::Cached => {
            // Policy only answers from cache when a payload is present.
            let stored = lookup
                .payload
                .ok_or_else(|| AppError::InternalError("cached payload vanished".into()))?;
            let json = state.documents.decode_json(&stored).map_err(|e| {
                tracing::error!(player_id = %id, error = %e, "Failed to decode cached data");
                AppError::Decode(e)
            })?;
            Ok((StatusCode::OK, [(CONTENT_TYPE, "application/json")], json).into_response())
        }
        Answer::WaitingForData => Err(AppError::WaitingForData),
        Answer::NotConfigured => Err(AppError::NotConfigured),
    }
}

fn enqueue_refresh(state: &AppState, id: PlayerId, ctx: &RequestContext) {
    let mut request = RefreshRequest::new(id);
    if let (Some(name), Some(requester)) = (&ctx.requester_name, &ctx.requester_id) {
        request = request.with_requester(name.clone(), requester.clone());
    }

    if state.refresh_queue.enqueue(request) {
        tracing::debug!(
            player_id = %id,
            requester_name = ctx.requester_name.as_deref().unwrap_or("-"),
            queue_depth = state.refresh_queue.depth(),
            "Refresh queued",
        );
    }
}

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Mount the player lookup route.
///
/// ```text
/// /{id}        GET cached player document
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(handlers::player::get_player))
}

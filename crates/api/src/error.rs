use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use playercache_worker::DocumentError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Every variant renders as `{"error": "<message>"}`. Only validation,
/// configuration and decode problems are user-visible; refresh outcomes
/// never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The path segment is not a UUID.
    #[error("Invalid UUID format")]
    InvalidId,

    /// Requester headers are malformed or only partly present.
    #[error("Incomplete request")]
    IncompleteRequest,

    /// No cached entry and no way to refresh it.
    #[error("No API key configured")]
    NotConfigured,

    /// No cached entry yet; a refresh has been queued.
    #[error("Waiting for data")]
    WaitingForData,

    /// The stored payload could not be decoded. The entry is left as is.
    #[error("Failed to decode cached data")]
    Decode(#[source] DocumentError),

    /// A cache store error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidId | AppError::IncompleteRequest => StatusCode::BAD_REQUEST,
            AppError::NotConfigured | AppError::Decode(_) => StatusCode::FORBIDDEN,
            AppError::WaitingForData => StatusCode::ACCEPTED,
            AppError::Database(_) | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal error");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

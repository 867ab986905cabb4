//! Mapping from domain errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use busline_core::TrackerError;
use serde_json::json;

/// Error returned by handlers; renders the JSON bodies clients expect.
#[derive(Debug)]
pub struct ApiError(pub TrackerError);

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            TrackerError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
            TrackerError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            TrackerError::NotFound(_) => (StatusCode::NOT_FOUND, "no location yet".to_string()),
            TrackerError::Empty => (StatusCode::NOT_FOUND, "no locations yet".to_string()),
            TrackerError::StorageUnavailable { .. } => {
                tracing::error!("Request failed: {}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage unavailable".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON error mapping for the HTTP surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use druckwerk_core::DruckwerkError;

/// Wrapper turning a `DruckwerkError` into a JSON error response.
///
/// Handlers return `Result<_, ApiError>` and use `?` on any core operation.
#[derive(Debug)]
pub struct ApiError(pub DruckwerkError);

impl From<DruckwerkError> for ApiError {
    fn from(err: DruckwerkError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            DruckwerkError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            DruckwerkError::Auth(_) => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            DruckwerkError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            // Dispatch-time faults are recorded on the job, never raised
            // across a request; reaching here means a programming error.
            DruckwerkError::Configuration(msg) | DruckwerkError::Dispatch(msg) => {
                error!("dispatch error escaped to the HTTP layer: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            DruckwerkError::Database(msg) => {
                error!("storage failure: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage failure".to_string())
            }
            DruckwerkError::Io(e) => {
                error!("I/O failure: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            DruckwerkError::Serialization(e) => {
                error!("serialization failure: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

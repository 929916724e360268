//! Error handling for HTTP handlers

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use keygen_core::Error as KeygenError;

pub const INVALID_USER_ID: &str = "userId must be a positive integer";

/// Errors returned by the HTTP layer
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{}", INVALID_USER_ID)]
    InvalidUserId,

    #[error(transparent)]
    Keygen(#[from] KeygenError),
}

/// Convert key manager errors to an HTTP status
pub fn keygen_error_to_status(error: &KeygenError) -> StatusCode {
    match error {
        KeygenError::UnsupportedNetwork(_) => StatusCode::BAD_REQUEST,
        KeygenError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        KeygenError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message safe to return to clients; internal details stay in logs
pub fn keygen_error_message(error: &KeygenError) -> String {
    match error {
        KeygenError::UnsupportedNetwork(_) | KeygenError::InvalidInput(_) => error.to_string(),
        KeygenError::Storage(_) => "Storage unavailable".to_string(),
        _ => "Internal server error".to_string(),
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidUserId => StatusCode::BAD_REQUEST,
            ApiError::Keygen(e) => keygen_error_to_status(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::InvalidUserId => INVALID_USER_ID.to_string(),
            ApiError::Keygen(e) => {
                if status.is_server_error() {
                    error!(error = %e, "Request failed");
                }
                keygen_error_message(e)
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

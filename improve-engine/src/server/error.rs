use crate::orchestrator::ImproveError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use improve_types::ErrorBody;
use thiserror::Error;
use tracing::{debug, error};

/// Errors surfaced to HTTP callers.
///
/// The display text is the public `error` message; upstream detail is logged
/// and never returned.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing contentHtml")]
    MissingContent,

    #[error("Invalid JSON body")]
    MalformedPayload,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Internal error")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingContent | AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::MalformedPayload
        }
    }
}

impl From<ImproveError> for AppError {
    fn from(e: ImproveError) -> Self {
        match e {
            ImproveError::EmptyContent => AppError::MissingContent,
            other => {
                error!("Improve API error: {}", other);
                AppError::Internal
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

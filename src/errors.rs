//! API error types.
//!
//! Every variant maps to a fixed HTTP status and response shape.  The
//! enum implements [`axum::response::IntoResponse`] so handlers can
//! simply return `Err(ApiError::NotFound)`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Generate a 16-character hex request ID.
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes).to_uppercase()
}

/// Errors surfaced by the route layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A lookup yielded no matching record.
    #[error("The requested record does not exist")]
    NotFound,

    /// The image upload could not be completed.
    #[error("{detail}")]
    UploadFailed { detail: String },

    /// Catch-all for unexpected store failures. The real error is
    /// logged; the client sees a generic message.
    #[error("We encountered an internal error, please try again.")]
    Internal(#[from] anyhow::Error),
}

/// Structured error payload: `{"errors":[{"title":...,"detail":...}]}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorDetail>,
}

/// A single error entry in an [`ErrorBody`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub title: String,
    pub detail: String,
}

impl ErrorBody {
    /// Build a single-error payload.
    pub fn single(title: &str, detail: &str) -> Self {
        Self {
            errors: vec![ErrorDetail {
                title: title.to_string(),
                detail: detail.to_string(),
            }],
        }
    }
}

impl ApiError {
    /// Return the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::UploadFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            // Not-found responses carry no body.
            ApiError::NotFound => status.into_response(),
            ApiError::UploadFailed { detail } => (
                status,
                Json(ErrorBody::single("Image Upload Error", &detail)),
            )
                .into_response(),
            ApiError::Internal(err) => {
                error!("internal error serving request: {err:#}");
                (
                    status,
                    Json(ErrorBody::single(
                        "Internal Server Error",
                        "an unexpected error occurred",
                    )),
                )
                    .into_response()
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

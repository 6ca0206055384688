//! Error-to-response mapping.
//!
//! Every failure is mapped once to a status code and a minimal
//! `{ "error": "..." }` body. Internal detail is logged, never returned.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::archive::{ArchiveError, SelectionError};
use crate::tableau::TableauError;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Client input was malformed or incomplete.
    #[error("{0}")]
    BadRequest(String),

    /// Upstream sign-in was rejected or yielded no session token.
    #[error("Authentication failed.")]
    AuthenticationFailed,

    /// The body could not be read or decoded as JSON.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Any other failure; the message is generic and safe to return.
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Map a Tableau error, logging its detail under `message`.
    pub fn from_tableau(err: TableauError, message: &'static str) -> Self {
        match err {
            TableauError::InvalidCredentials(reason) => ApiError::BadRequest(reason),
            TableauError::Unauthorized => {
                tracing::warn!("Tableau authentication failed");
                ApiError::AuthenticationFailed
            }
            other => {
                tracing::error!(error = %other, "{}", message);
                ApiError::Internal(message)
            }
        }
    }

    /// Map an archive failure, logging its detail under `message`.
    pub fn from_archive(err: ArchiveError, message: &'static str) -> Self {
        tracing::error!(error = %err, "{}", message);
        ApiError::Internal(message)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Syntax and shape errors are plain client errors; size and
        // content-type rejections keep their own status.
        let status = match rejection.status() {
            StatusCode::UNPROCESSABLE_ENTITY => StatusCode::BAD_REQUEST,
            other => other,
        };
        ApiError::Rejected {
            status,
            message: rejection.body_text(),
        }
    }
}

impl From<SelectionError> for ApiError {
    fn from(err: SelectionError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geomatricula_processing::Error as ProcessingError;
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Partial revision rejected: {0}")]
    PartialRevision(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Proposal {0} is not the pending proposal")]
    ProposalMismatch(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Join error")]
    Join(#[from] tokio::task::JoinError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD"),
            ApiError::PartialRevision(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "PARTIAL_REVISION")
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::ProposalMismatch(_) => (StatusCode::CONFLICT, "PROPOSAL_MISMATCH"),
            ApiError::InvalidTransition(_) => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TASK_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ProcessingError> for ApiError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::InvalidPayload(msg) => ApiError::InvalidPayload(msg),
            ProcessingError::PartialRevision(msg) => ApiError::PartialRevision(msg),
            ProcessingError::ProposalMismatch { requested } => ApiError::ProposalMismatch(requested),
            err @ ProcessingError::InvalidTransition { .. } => {
                ApiError::InvalidTransition(err.to_string())
            }
            ProcessingError::NotFound(id) => ApiError::NotFound(format!("project {id}")),
            ProcessingError::Repository(msg) => ApiError::Store(msg),
            // Degenerate export input is the caller's geometry, not ours
            ProcessingError::Geometry(err) => ApiError::InvalidPayload(err.to_string()),
            ProcessingError::Json(err) => ApiError::Internal(format!("JSON error: {}", err)),
        }
    }
}

impl From<cacache::Error> for ApiError {
    fn from(err: cacache::Error) -> Self {
        ApiError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("JSON error: {}", err))
    }
}

//! API Error Handling
//!
//! Structured error responses with stable codes, proper HTTP statuses,
//! and request tracking. Core errors are translated here; store
//! internals are logged and never echoed to callers.

use crate::errors::CoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level API error response with request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

/// Error body with structured information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code (BAD_REQUEST, INSUFFICIENT_BALANCE, ...)
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API error with request tracking
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug)]
pub enum ApiErrorKind {
    BadRequest(String),
    InsufficientBalance(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::BadRequest(message),
            request_id,
        }
    }

    pub fn not_found(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::NotFound(message),
            request_id,
        }
    }

    pub fn internal(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::Internal(message),
            request_id,
        }
    }

    /// Translate a core error. Internal details are logged here and
    /// replaced with a generic message in the response body.
    pub fn from_core(request_id: String, error: CoreError) -> Self {
        let kind = match error {
            CoreError::Validation(msg) => ApiErrorKind::BadRequest(msg),
            CoreError::InsufficientBalance { .. } => {
                ApiErrorKind::InsufficientBalance(error.to_string())
            }
            CoreError::UnknownPrincipal(_) | CoreError::BetNotFound(_) => {
                ApiErrorKind::NotFound(error.to_string())
            }
            CoreError::Conflict(msg) => {
                tracing::warn!(request_id = %request_id, "Settlement conflict: {}", msg);
                ApiErrorKind::Conflict(
                    "Settlement is contended, please retry the request".to_string(),
                )
            }
            CoreError::Integrity(msg) | CoreError::Store(msg) => {
                tracing::error!(request_id = %request_id, "Internal error: {}", msg);
                ApiErrorKind::Internal("Internal server error".to_string())
            }
        };
        Self { kind, request_id }
    }

    /// True for caller-side rejections (4xx).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::BadRequest(_)
                | ApiErrorKind::InsufficientBalance(_)
                | ApiErrorKind::NotFound(_)
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ApiErrorKind::BadRequest(msg) => write!(f, "[{}] Bad Request: {}", self.request_id, msg),
            ApiErrorKind::InsufficientBalance(msg) => {
                write!(f, "[{}] Insufficient Balance: {}", self.request_id, msg)
            }
            ApiErrorKind::NotFound(msg) => write!(f, "[{}] Not Found: {}", self.request_id, msg),
            ApiErrorKind::Conflict(msg) => write!(f, "[{}] Conflict: {}", self.request_id, msg),
            ApiErrorKind::Internal(msg) => write!(f, "[{}] Internal Error: {}", self.request_id, msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self.kind {
            ApiErrorKind::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiErrorKind::InsufficientBalance(msg) => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_BALANCE", msg.clone())
            }
            ApiErrorKind::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiErrorKind::Conflict(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CONFLICT_RETRY_EXHAUSTED",
                msg.clone(),
            ),
            ApiErrorKind::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = Json(ErrorResponse {
            request_id: self.request_id.clone(),
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

//! API error handling

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain_ledger::{LedgerError, StoreError};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {message}")]
    Conflict { message: String, retryable: bool },

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// True when the client may retry the same request with backoff
    pub retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, retryable, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", false, msg.clone()),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", false, msg.clone())
            }
            ApiError::Conflict { message, retryable } => {
                (StatusCode::CONFLICT, "conflict", *retryable, message.clone())
            }
            ApiError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                true,
                msg.clone(),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                false,
                msg.clone(),
            ),
            ApiError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                false,
                msg.clone(),
            ),
            ApiError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                false,
                msg.clone(),
            ),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            retryable,
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(v) => ApiError::Validation(v.to_string()),
            LedgerError::NotFound(id) => ApiError::NotFound(format!("Entry {id} not found")),
            // Re-reversing is a settled outcome; retrying cannot change it.
            LedgerError::ChainedReversalForbidden(_) => ApiError::Conflict {
                message: err.to_string(),
                retryable: false,
            },
            LedgerError::CommitConflict { .. } => ApiError::Conflict {
                message: err.to_string(),
                retryable: true,
            },
            LedgerError::OwnerLockTimeout { .. } => ApiError::Unavailable(err.to_string()),
            LedgerError::Calculation(msg) => ApiError::Internal(msg),
            LedgerError::Storage(StoreError::NotFound(msg)) => ApiError::NotFound(msg),
            LedgerError::Storage(store) => ApiError::Database(store.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::EntryId;

    #[test]
    fn test_ledger_error_mapping() {
        let not_found = ApiError::from(LedgerError::NotFound(EntryId::new_v7()));
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let conflict = ApiError::from(LedgerError::CommitConflict {
            owner: "business/biz-1".to_string(),
            attempts: 4,
        });
        assert!(matches!(
            conflict,
            ApiError::Conflict {
                retryable: true,
                ..
            }
        ));

        let chained = ApiError::from(LedgerError::ChainedReversalForbidden(EntryId::new_v7()));
        assert!(matches!(
            chained,
            ApiError::Conflict {
                retryable: false,
                ..
            }
        ));

        let timeout = ApiError::from(LedgerError::OwnerLockTimeout {
            owner: "business/biz-1".to_string(),
            waited_ms: 5000,
        });
        assert!(matches!(timeout, ApiError::Unavailable(_)));
    }
}

//! Request-level error type.
//!
//! Every handler returns `Result<_, AppError>`. Lower layers keep their
//! own error enums and are folded in here via `From`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::db::RepositoryError;
use crate::grammar::GrammarError;
use crate::storage::StorageError;
use crate::workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not logged in")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("upstream service failed: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!("Request failed: {}", detail);
                "internal error".to_string()
            }
            Self::Upstream(detail) => {
                tracing::warn!("Upstream failure: {}", detail);
                self.to_string()
            }
            other => other.to_string(),
        };

        (
            self.status(),
            Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Forbidden { .. } => Self::Forbidden(err.to_string()),
            WorkflowError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
            WorkflowError::MissingComment { .. } => Self::Validation(err.to_string()),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(_) => Self::Conflict(err.to_string()),
            RepositoryError::NotFound(_) => Self::NotFound(err.to_string()),
            RepositoryError::Corrupt(_) | RepositoryError::Database(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidName(_) => Self::Validation(err.to_string()),
            StorageError::NotFound(_) => Self::NotFound(err.to_string()),
            StorageError::Io(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<GrammarError> for AppError {
    fn from(err: GrammarError) -> Self {
        match err {
            GrammarError::Storage(inner) => inner.into(),
            GrammarError::Extraction(_) => Self::Validation(err.to_string()),
            GrammarError::Request(_) | GrammarError::Status { .. } | GrammarError::Parse(_) => {
                Self::Upstream(err.to_string())
            }
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}

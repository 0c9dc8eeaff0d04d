use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::db::is_connectivity_error;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const CONNECTIVITY_MESSAGE: &str = "Database temporarily unavailable. Please try again \
    in a few moments. If the issue persists, contact support.";
pub const PERSISTENCE_MESSAGE: &str = "Database error occurred. Please try again later or \
    contact support if the issue persists.";

/// Field name → user-visible message, serialized as the `fieldErrors` object.
pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Error, Debug)]
pub enum AppError {
    /// Bad or missing form input, with per-field messages.
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: FieldErrors,
    },

    /// Invalid credentials or an inactive account. The message is kept
    /// identical for unknown email and wrong password so responses cannot
    /// be used to enumerate accounts.
    #[error("{0}")]
    Auth(String),

    /// The database stayed unreachable after the retry budget was spent.
    #[error("{}", CONNECTIVITY_MESSAGE)]
    Connectivity,

    /// Any other persistence-level failure.
    #[error("{}", PERSISTENCE_MESSAGE)]
    Persistence,

    /// Everything else; carries only the user-visible message.
    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors,
        }
    }

    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = FieldErrors::new();
        field_errors.insert(field, message.clone());
        Self::Validation {
            message,
            field_errors,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if is_connectivity_error(&err.to_string()) {
            error!(error = %err, "database unreachable");
            Self::Connectivity
        } else {
            error!(error = %err, "persistence error");
            Self::Persistence
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(rename = "fieldErrors", skip_serializing_if = "Option::is_none")]
    field_errors: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation { .. } | AppError::Auth(_) => StatusCode::BAD_REQUEST,
            AppError::Connectivity => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Persistence | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let error = self.to_string();
        let field_errors = match self {
            AppError::Validation { field_errors, .. } if !field_errors.is_empty() => {
                Some(field_errors)
            }
            _ => None,
        };
        (status, Json(ErrorBody { error, field_errors })).into_response()
    }
}

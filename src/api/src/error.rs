//! Error handling for the subscription API
//!
//! Maps domain and persistence failures onto HTTP status codes and a uniform
//! JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sub_service_database::DatabaseError;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Message returned to callers for any server-side failure
const GENERIC_SERVER_ERROR: &str = "Internal server error";

/// Main error type for the API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(DatabaseError),

    #[error("Validation failed: {field}: {message}")]
    Validation {
        field: String,
        message: String,
        details: Vec<ErrorDetail>,
    },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Request timeout: {message}")]
    Timeout { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

/// Standardized error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "validation_error")]
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ErrorDetail>>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error detail for validation errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub field: String,
    pub error: String,
}

impl ApiError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = message.into();
        Self::Validation {
            details: vec![ErrorDetail {
                field: field.clone(),
                error: message.clone(),
            }],
            field,
            message,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::validation("request", message)
    }

    /// Create a new not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::NotFound { .. } => "not_found_error",
            ApiError::Timeout { .. } => "timeout_error",
            ApiError::Database(_) => "database_error",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    /// Check if this error should be logged
    pub fn should_log(&self) -> bool {
        !matches!(
            self,
            ApiError::Validation { .. } | ApiError::NotFound { .. } | ApiError::Timeout { .. }
        )
    }

    /// Message safe to show to the caller
    fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            GENERIC_SERVER_ERROR.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(id) => ApiError::not_found(format!("subscription {id}")),
            other => ApiError::Database(other),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |e| ErrorDetail {
                    field: field.to_string(),
                    error: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let (field, message) = details
            .first()
            .map(|d| (d.field.clone(), d.error.clone()))
            .unwrap_or_else(|| ("request".to_string(), "Validation failed".to_string()));

        ApiError::Validation {
            field,
            message,
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_type = self.error_type();

        // Full detail stays in the server log
        if self.should_log() {
            error!(
                error = %self,
                status_code = %status_code,
                error_type = error_type,
                "API error occurred"
            );
        }

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message: self.public_message(),
            details: match self {
                ApiError::Validation { details, .. } => Some(details),
                _ => None,
            },
            timestamp: chrono::Utc::now(),
        };

        (status_code, Json(error_response)).into_response()
    }
}

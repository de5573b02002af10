// HTTP API Error Types
use axum::{extract::rejection::PathRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::database::DatabaseError;
use crate::database::models::ValidationError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<BTreeMap<String, String>>,
    },
    InvalidJson(String),

    // 404 Not Found
    NotFound(String),

    // 405 Method Not Allowed
    MethodNotAllowed(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::MethodNotAllowed(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Body shape shared by every error response: `{"code", "message"}`,
    /// plus `"errors"` keyed by field for validation failures.
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "code": self.status_code().as_u16(),
            "message": self.message(),
        });

        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            body["errors"] = json!(field_errors);
        }

        body
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<BTreeMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        ApiError::MethodNotAllowed(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::NotAnObject => ApiError::invalid_json("Expected a JSON object"),
            ValidationError::Fields(field_errors) => {
                ApiError::validation_error("Invalid to-do item", Some(field_errors))
            }
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        if rejection.status().is_server_error() {
            tracing::error!("Path extraction failed: {}", rejection.body_text());
            ApiError::internal_server_error("An error occurred while processing your request")
        } else {
            ApiError::bad_request(rejection.body_text())
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::DuplicateKey { .. } => {
                tracing::warn!("Store rejected duplicate key: {}", err);
                ApiError::conflict("To-do item already exists")
            }
            // Don't expose driver errors to clients
            DatabaseError::Connection(_) | DatabaseError::Closed => {
                tracing::error!("Database connection error: {}", err);
                ApiError::internal_server_error("Database unavailable")
            }
            DatabaseError::InvalidProcedure(ref name) => {
                tracing::error!("Refused to call procedure {:?}", name);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Backend { .. } | DatabaseError::Sqlx(_) => {
                tracing::error!("Database error: {}", err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

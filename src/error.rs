/// Error Handling Module
///
/// One unified error type for the whole API. Expected domain failures
/// (duplicate email, wrong password, rented car, ...) map to 4xx responses
/// with a structured `{"error": {"name", "message", "details"}}` body;
/// anything unexpected is reported as an opaque 500.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::models::{CarRecord, Role};

/// Validation errors for input data, rejected before any persistence
/// round-trip.
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
        }
    }
}

impl StdError for ValidationError {}

/// Central error type for all request handling.
#[derive(Debug)]
pub enum ApiError {
    EmailAlreadyTaken { email: String },
    EmailNotRegistered { email: String },
    WrongPassword,
    InvalidToken,
    InsufficientAccess { current_role: Role },
    RecordNotFound { name: String },
    CarAlreadyRented { car: CarRecord },
    Validation(ValidationError),
    Database(String),
    Internal(String),
}

impl ApiError {
    /// Stable error name reported to clients in the response body.
    pub fn name(&self) -> &'static str {
        match self {
            ApiError::EmailAlreadyTaken { .. } => "EmailAlreadyTakenError",
            ApiError::EmailNotRegistered { .. } => "EmailNotRegisteredError",
            ApiError::WrongPassword => "WrongPasswordError",
            ApiError::InvalidToken => "InvalidTokenError",
            ApiError::InsufficientAccess { .. } => "InsufficientAccessError",
            ApiError::RecordNotFound { .. } => "RecordNotFoundError",
            ApiError::CarAlreadyRented { .. } => "CarAlreadyRentedError",
            ApiError::Validation(_) => "ValidationError",
            ApiError::Database(_) => "DatabaseError",
            ApiError::Internal(_) => "InternalServerError",
        }
    }

    /// Structured context attached under `error.details`.
    pub fn details(&self) -> serde_json::Value {
        match self {
            ApiError::EmailAlreadyTaken { email } | ApiError::EmailNotRegistered { email } => {
                serde_json::json!({ "email": email })
            }
            ApiError::InsufficientAccess { current_role } => {
                serde_json::json!({ "role": current_role })
            }
            ApiError::RecordNotFound { name } => serde_json::json!({ "name": name }),
            ApiError::CarAlreadyRented { car } => serde_json::json!({ "car": car }),
            _ => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::EmailAlreadyTaken { email } => {
                write!(f, "{} is already registered!", email)
            }
            ApiError::EmailNotRegistered { email } => {
                write!(f, "{} is not registered!", email)
            }
            ApiError::WrongPassword => write!(f, "Wrong password!"),
            ApiError::InvalidToken => write!(f, "Missing or invalid bearer token!"),
            ApiError::InsufficientAccess { current_role } => {
                write!(f, "{} is not allowed to perform this operation!", current_role)
            }
            ApiError::RecordNotFound { name } => write!(f, "{} not found!", name),
            ApiError::CarAlreadyRented { car } => write!(f, "{} is already rented!", car.name),
            ApiError::Validation(e) => write!(f, "{}", e),
            ApiError::Database(msg) => write!(f, "Database error: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}

/// Response body shape: `{"error": {"name", "message", "details"}}`.
#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub error: ErrorEnvelope,
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorEnvelope {
    pub name: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl ErrorBody {
    pub fn from_error(err: &ApiError) -> Self {
        Self {
            error: ErrorEnvelope {
                name: err.name().to_string(),
                message: err.to_string(),
                details: err.details(),
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            // Registration and booking conflicts report 422.
            ApiError::EmailAlreadyTaken { .. } | ApiError::CarAlreadyRented { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::EmailNotRegistered { .. } | ApiError::RecordNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            // Role mismatch reports 401 rather than 403; the boundary
            // deliberately conflates the two.
            ApiError::WrongPassword
            | ApiError::InvalidToken
            | ApiError::InsufficientAccess { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error = %self,
                "Request failed"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                error = %self,
                "Request rejected"
            );
        }

        // Unexpected failures stay opaque to the caller.
        let body = if status.is_server_error() {
            ErrorBody {
                error: ErrorEnvelope {
                    name: self.name().to_string(),
                    message: "Internal server error".to_string(),
                    details: serde_json::Value::Null,
                },
            }
        } else {
            ErrorBody::from_error(self)
        };

        HttpResponse::build(status).json(body)
    }
}

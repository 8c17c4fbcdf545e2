use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;
use validator::ValidationErrors;

/// Application error types with machine-readable external reasons
#[derive(Debug)]
pub enum AppError {
    /// Database errors - log internally, return generic reason
    Database(DbErr),
    /// Validation errors - safe to return details
    Validation(ValidationErrors),
    /// Malformed input caught outside validator derive
    BadRequest(String),
    /// Invalid or malformed bearer token
    InvalidToken,
    /// Token expired
    TokenExpired,
    /// Caller is not allowed to touch this household's rows
    Unauthorized,
    /// Referenced row does not exist
    NotFound(String),
    /// Uniqueness violation - callers treat as "already processed"
    Conflict(String),
    /// Internal server error
    Internal(String),
    /// Rate limit exceeded
    RateLimitExceeded,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(_) => write!(f, "Database error"),
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::InvalidToken => write!(f, "Invalid token"),
            AppError::TokenExpired => write!(f, "Token expired"),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::NotFound(what) => write!(f, "{} not found", what),
            AppError::Conflict(what) => write!(f, "{} already processed", what),
            AppError::Internal(_) => write!(f, "Internal server error"),
            AppError::RateLimitExceeded => write!(f, "Too many requests"),
        }
    }
}

impl AppError {
    /// Uniqueness-violation check across both store backends.
    ///
    /// Postgres surfaces duplicate-key failures through `DbErr`; the
    /// in-memory store returns `Conflict` directly.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Conflict(_) => true,
            AppError::Database(err) => {
                let msg = err.to_string();
                msg.contains("duplicate key") || msg.contains("UNIQUE constraint")
            }
            _ => false,
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                // Log the actual error internally
                tracing::error!("Database error: {:?}", e);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse { error: "server_error", details: None },
                )
            }
            AppError::Validation(errors) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "validation_failed",
                    details: Some(serde_json::to_value(errors).unwrap_or_default()),
                },
            ),
            AppError::BadRequest(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "validation_failed",
                    details: Some(serde_json::Value::String(msg.clone())),
                },
            ),
            AppError::InvalidToken | AppError::TokenExpired => (
                actix_web::http::StatusCode::UNAUTHORIZED,
                ErrorResponse { error: "invalid_token", details: None },
            ),
            AppError::Unauthorized => (
                actix_web::http::StatusCode::UNAUTHORIZED,
                ErrorResponse { error: "unauthorized", details: None },
            ),
            AppError::NotFound(what) => (
                actix_web::http::StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "not_found",
                    details: Some(serde_json::Value::String(what.clone())),
                },
            ),
            AppError::Conflict(what) => (
                actix_web::http::StatusCode::CONFLICT,
                ErrorResponse {
                    error: "already_processed",
                    details: Some(serde_json::Value::String(what.clone())),
                },
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse { error: "server_error", details: None },
                )
            }
            AppError::RateLimitExceeded => (
                actix_web::http::StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse { error: "rate_limited", details: None },
            ),
        };

        HttpResponse::build(status).json(error_response)
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Database(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::Validation(err)
    }
}

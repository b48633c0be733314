//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! It centralizes error management, providing a consistent way to handle and represent
//! the failure classes the API can produce: invalid input, duplicate registrations,
//! authentication failures, missing (or not-owned) resources, and store failures.
//!
//! `AppError` implements `actix_web::error::ResponseError` to convert application
//! errors into HTTP responses with JSON bodies. `From` implementations for
//! `sqlx::Error`, `validator::ValidationErrors`, `jsonwebtoken::errors::Error`, and
//! `bcrypt::BcryptError` allow propagation with the `?` operator.
//!
//! Server-side failures (`Database`, `Internal`) are logged with their cause but
//! serialize a generic message: no internal detail crosses the API boundary.

use actix_web::{error::ResponseError, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all failure classes that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or missing required input (HTTP 400).
    Validation(String),
    /// Username or email already registered (HTTP 400).
    Duplicate(String),
    /// Bad credentials or an expired/invalid/malformed token (HTTP 401).
    /// The message is kept uniform for credential failures to avoid
    /// username enumeration.
    Unauthorized(String),
    /// Resource absent, or present but not owned by the caller (HTTP 404).
    /// Both cases produce an identical response so ownership never leaks.
    NotFound(String),
    /// A failure originating from the backing store (HTTP 500).
    Database(String),
    /// Any other unexpected server-side error (HTTP 500).
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation Error: {}", msg),
            AppError::Duplicate(msg) => write!(f, "Duplicate: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Database(msg) => write!(f, "Database Error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// This lets Actix Web translate `AppError` results from handlers into the
/// correct HTTP status codes and JSON error bodies.
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(msg) => HttpResponse::BadRequest().json(json!({
                "error": msg
            })),
            AppError::Duplicate(msg) => HttpResponse::BadRequest().json(json!({
                "error": msg
            })),
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(json!({
                "error": msg
            })),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "error": msg
            })),
            // Store and internal errors keep their detail server-side.
            AppError::Database(msg) => {
                log::error!("database error: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }))
            }
            AppError::Internal(msg) => {
                log::error!("internal error: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }))
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `sqlx::Error::RowNotFound` maps to `AppError::NotFound`, and a Postgres
/// unique violation (SQLSTATE 23505) maps to `AppError::Duplicate`; everything
/// else becomes `AppError::Database`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            // Handler-level exists checks race with concurrent writers; the
            // loser hits the unique constraint and must still report a
            // duplicate, not a server error.
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                let message = match db.constraint() {
                    Some(constraint) if constraint.contains("username") => {
                        "Username is already taken"
                    }
                    Some(constraint) if constraint.contains("email") => "Email is already in use",
                    _ => "Record already exists",
                };
                AppError::Duplicate(message.into())
            }
            _ => AppError::Database(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::Validation`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::Validation(error.to_string())
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Unauthorized`.
///
/// Used when token processing (signing or verification) fails.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::Internal`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(error.to_string())
    }
}

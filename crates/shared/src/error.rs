//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Validation error carrying a structured payload for the client.
    #[error("Validation error: {message}")]
    Rejected {
        /// Human readable message.
        message: String,
        /// Extra fields returned under `details`.
        details: serde_json::Value,
    },

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// External service error.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::Rejected { .. } => 400,
            Self::Conflict(_) => 409,
            Self::ExternalService(_) => 502,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) | Self::Rejected { .. } => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the message shown to API clients, without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized(m)
            | Self::NotFound(m)
            | Self::Validation(m)
            | Self::Conflict(m)
            | Self::Database(m)
            | Self::ExternalService(m)
            | Self::Internal(m)
            | Self::Rejected { message: m, .. } => m,
        }
    }

    /// Returns the structured details, if any.
    #[must_use]
    pub const fn details(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Rejected { details, .. } => Some(details),
            _ => None,
        }
    }
}

//! Client error types.

use thiserror::Error;

/// Client registration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Document number has the wrong length or non-digit characters.
    #[error("{kind} must be exactly {expected} digits")]
    InvalidDocument {
        /// Document type name.
        kind: &'static str,
        /// Required digit count.
        expected: usize,
    },

    /// A required field is empty.
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    /// Email is present but malformed.
    #[error("Invalid email address")]
    InvalidEmail,

    /// Email cannot receive gateway notifications.
    #[error("A deliverable email is required for online payments")]
    UndeliverableEmail,
}

impl From<ClientError> for lendshop_shared::AppError {
    fn from(err: ClientError) -> Self {
        Self::Validation(err.to_string())
    }
}

//! JSON error envelope for handlers.
//!
//! Handlers return `Result<_, ApiError>`; every domain and repository error
//! converts through `AppError` and renders as
//! `{"error": CODE, "message": text, "details"?: {...}}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lendshop_shared::AppError;
use serde_json::json;

/// An `AppError` on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// A 400 with a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// A 404 with a message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(AppError::NotFound(message.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }

        // Keep driver messages out of client responses
        let message = match &self.0 {
            AppError::Database(_) => "A database error occurred",
            AppError::Internal(_) => "An internal error occurred",
            other => other.message(),
        };

        let mut body = json!({
            "error": self.0.error_code(),
            "message": message,
        });
        if let Some(details) = self.0.details() {
            body["details"] = details.clone();
        }

        (status, Json(body)).into_response()
    }
}

macro_rules! into_api_error {
    ($($error:ty),+ $(,)?) => {
        $(
            impl From<$error> for ApiError {
                fn from(err: $error) -> Self {
                    Self(err.into())
                }
            }
        )+
    };
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

into_api_error!(
    lendshop_core::cash::CashError,
    lendshop_core::client::ClientError,
    lendshop_core::collection::CollectionError,
    lendshop_core::schedule::ScheduleError,
    lendshop_db::repositories::CashSessionError,
    lendshop_db::repositories::ClientRepoError,
    lendshop_db::repositories::InstallmentError,
    lendshop_db::repositories::LoanError,
    lendshop_db::repositories::PaymentError,
    lendshop_integrations::IntegrationError,
);

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

//! Integration error types.

use lendshop_shared::AppError;
use thiserror::Error;

/// Errors raised by outbound HTTP integrations.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// Credentials for the service are missing.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// The request could not be sent or the body could not be read.
    #[error("{service} request failed: {source}")]
    Http {
        /// Service name.
        service: &'static str,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        /// Service name.
        service: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, for logging.
        body: String,
    },

    /// The service is throttling us.
    #[error("{0} rate limit reached, try again shortly")]
    RateLimited(&'static str),

    /// The response did not have the expected shape.
    #[error("Unexpected response from {service}: {message}")]
    InvalidResponse {
        /// Service name.
        service: &'static str,
        /// What was wrong.
        message: String,
    },
}

impl IntegrationError {
    pub(crate) fn http(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Http { service, source }
    }

    /// Reads the body of a failed response into an error.
    pub(crate) async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        if status == 429 {
            return Self::RateLimited(service);
        }
        let body = response.text().await.unwrap_or_default();
        Self::Status {
            service,
            status,
            body,
        }
    }
}

impl From<IntegrationError> for AppError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::NotConfigured(_) => Self::Internal(err.to_string()),
            _ => Self::ExternalService(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_external_service() {
        let err = IntegrationError::Status {
            service: "Flow",
            status: 400,
            body: "bad apiKey".into(),
        };
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 502);
        assert!(app.to_string().contains("bad apiKey"));
    }

    #[test]
    fn test_not_configured_is_internal() {
        let app: AppError = IntegrationError::NotConfigured("MercadoPago").into();
        assert_eq!(app.status_code(), 500);
    }
}

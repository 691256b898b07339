//! Operator token middleware for protected routes.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use lendshop_shared::AppError;

use crate::AppState;
use crate::error::ApiError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Compares tokens without short-circuiting on the first differing byte.
fn tokens_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len()
        && given
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Checks the operator token on protected routes.
///
/// When `auth.operator_token` is not configured every request passes.
pub async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state
        .config
        .auth
        .operator_token
        .as_deref()
        .filter(|t| !t.is_empty())
    else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError(AppError::Unauthorized(
            "Authorization header with Bearer token is required".to_string(),
        ))
        .into_response();
    };

    if !tokens_match(token, expected) {
        tracing::warn!(path = %request.uri().path(), "Rejected request with invalid operator token");
        return ApiError(AppError::Unauthorized("Invalid operator token".to_string()))
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("abc"), None);
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("s3cret", "s3cret"));
        assert!(!tokens_match("s3cret", "s3cres"));
        assert!(!tokens_match("s3cret", "s3cret-longer"));
        assert!(!tokens_match("", "s3cret"));
    }

    mod router {
        use axum::{
            body::Body,
            http::{Request, StatusCode, header::AUTHORIZATION},
        };

        use crate::test_support::{
            FakeFlow, FakeIdentity, FakeMercadoPago, body_json, send, test_state,
        };

        fn guarded() -> crate::AppState {
            test_state(
                Some("s3cret"),
                FakeFlow::default(),
                FakeMercadoPago::default(),
                FakeIdentity::default(),
            )
        }

        #[tokio::test]
        async fn test_protected_route_without_token_is_401() {
            let response = send(
                guarded(),
                Request::get("/api/v1/loans").body(Body::empty()).unwrap(),
            )
            .await;

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = body_json(response).await;
            assert_eq!(body["error"], "UNAUTHORIZED");
        }

        #[tokio::test]
        async fn test_protected_route_with_wrong_token_is_401() {
            let response = send(
                guarded(),
                Request::get("/api/v1/clients")
                    .header(AUTHORIZATION, "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn test_valid_token_reaches_the_handler() {
            let response = send(
                guarded(),
                Request::get("/api/v1/clients/lookup/dni/12345678")
                    .header(AUTHORIZATION, "Bearer s3cret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn test_health_and_webhooks_stay_public() {
            let response = send(
                guarded(),
                Request::get("/api/v1/health").body(Body::empty()).unwrap(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);

            let response = send(
                guarded(),
                Request::post("/api/v1/flow/webhook")
                    .header("Content-Type", "application/x-www-form-urlencoded")
                    .body(Body::from("token="))
                    .unwrap(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}

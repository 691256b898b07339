//! Health check endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// "healthy" when the database answers, "degraded" otherwise.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Whether the database answered a ping.
    pub database: bool,
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database ping failed");
            false
        }
    };

    Json(HealthResponse {
        status: if database { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    use crate::test_support::{body_json, default_state, send};

    #[tokio::test]
    async fn test_health_reports_unreachable_database() {
        let response = send(
            default_state(),
            Request::get("/api/v1/health").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["database"], false);
    }
}

//! Cash-drawer session routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use lendshop_db::repositories::CashSessionRepository;
use lendshop_shared::types::PageRequest;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::AppState;
use crate::error::ApiResult;

/// Creates the cash session routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cash-sessions", get(list_sessions))
        .route("/cash-sessions/open", post(open_session))
        .route("/cash-sessions/current", get(current_session))
        .route("/cash-sessions/close", post(close_session))
}

/// Request body for opening the drawer.
#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    /// Cash placed in the drawer.
    pub opening_float: Decimal,
    /// Operator opening the drawer.
    pub opened_by: Option<String>,
}

/// Request body for closing the drawer.
#[derive(Debug, Deserialize)]
pub struct CloseSessionRequest {
    /// Cash physically counted.
    pub counted_cash: Decimal,
    /// Operator closing the drawer.
    pub closed_by: Option<String>,
}

/// POST `/cash-sessions/open` - Open the drawer.
async fn open_session(
    State(state): State<AppState>,
    Json(payload): Json<OpenSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = CashSessionRepository::new((*state.db).clone());
    let session = repo.open(payload.opening_float, payload.opened_by).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET `/cash-sessions/current` - Running totals of the open drawer.
async fn current_session(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let repo = CashSessionRepository::new((*state.db).clone());
    let summary = repo.current_summary().await?;
    Ok(Json(summary))
}

/// POST `/cash-sessions/close` - Reconcile and close the drawer.
async fn close_session(
    State(state): State<AppState>,
    Json(payload): Json<CloseSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = CashSessionRepository::new((*state.db).clone());
    let closed = repo
        .close(
            payload.counted_cash,
            state.config.cash.close_policy,
            payload.closed_by,
        )
        .await?;

    info!(
        session_id = %closed.session.id,
        variance = %closed.reconciliation.variance,
        "Cash session closed"
    );
    Ok(Json(closed))
}

/// GET `/cash-sessions` - Session history.
async fn list_sessions(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = CashSessionRepository::new((*state.db).clone());
    let sessions = repo.list(page).await?;
    Ok(Json(sessions))
}

//! Late-fee rate settings.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use lendshop_core::collection::LateFeeRate;
use lendshop_db::entities::late_fee_rates;
use lendshop_db::repositories::SettingsRepository;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppState;
use crate::error::ApiResult;

/// Creates the settings routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/settings/late-fee", get(get_late_fee).put(set_late_fee))
}

/// Request body for changing the late-fee rate.
#[derive(Debug, Deserialize)]
pub struct SetLateFeeRequest {
    /// Percentage of the balance, 0 to 100.
    pub rate_percent: Decimal,
    /// Operator changing the rate.
    pub set_by: Option<String>,
}

/// Current late-fee rate and the rates set before it.
#[derive(Debug, Serialize)]
pub struct LateFeeResponse {
    /// Percentage of the balance.
    pub rate_percent: Decimal,
    /// Every rate set so far, newest first.
    pub history: Vec<late_fee_rates::Model>,
}

/// GET `/settings/late-fee` - Current late-fee rate.
async fn get_late_fee(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let repo = SettingsRepository::new((*state.db).clone(), state.default_late_fee_rate());
    let rate = repo.late_fee_rate().await?;
    let history = repo.history().await?;
    Ok(Json(LateFeeResponse {
        rate_percent: rate.percent(),
        history,
    }))
}

/// PUT `/settings/late-fee` - Set a new late-fee rate.
///
/// Applies to payments recorded from now on; past payments keep their rate.
async fn set_late_fee(
    State(state): State<AppState>,
    Json(payload): Json<SetLateFeeRequest>,
) -> ApiResult<impl IntoResponse> {
    let rate = LateFeeRate::new(payload.rate_percent)?;
    let repo = SettingsRepository::new((*state.db).clone(), state.default_late_fee_rate());
    let row = repo.set_late_fee_rate(rate, payload.set_by).await?;
    info!(rate_percent = %row.rate_percent, set_by = ?row.set_by, "Late-fee rate changed by operator");
    Ok(Json(row))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    use crate::test_support::{body_json, default_state, send};

    #[tokio::test]
    async fn test_rate_above_100_is_rejected() {
        let response = send(
            default_state(),
            Request::put("/api/v1/settings/late-fee")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"rate_percent":"150"}"#))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}

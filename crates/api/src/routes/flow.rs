//! Flow checkout routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use lendshop_core::client::ClientService;
use lendshop_integrations::{FlowOrderRequest, flow::flow_amount};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::checkout::{self, CheckoutRequest};
use crate::AppState;
use crate::error::ApiResult;

/// Creates the Flow routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flow/payments", post(create_payment))
        .route("/flow/status/{token}", get(payment_status))
}

/// A created Flow order.
#[derive(Debug, Serialize)]
pub struct FlowPaymentResponse {
    /// Where to send the payer.
    pub redirect_url: String,
    /// Checkout token.
    pub token: String,
    /// Flow's order number.
    pub flow_order: i64,
    /// Amount charged, in whole units.
    pub amount: Decimal,
}

/// POST `/flow/payments` - Create a Flow order for an installment.
async fn create_payment(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> ApiResult<impl IntoResponse> {
    let target = checkout::resolve(&state, payload).await?;
    let email = ClientService::require_deliverable_email(target.email.as_deref())?;

    let base = state.config.gateways.public_base_url.trim_end_matches('/');
    let amount = flow_amount(target.amount);
    let order = state
        .flow
        .create_order(&FlowOrderRequest {
            commerce_order: target.installment_id.to_string(),
            subject: target.subject(),
            amount,
            email,
            url_confirmation: format!("{base}/api/v1/flow/webhook"),
            url_return: format!("{base}/payment-result"),
        })
        .await?;

    info!(
        installment_id = %target.installment_id,
        flow_order = order.flow_order,
        amount = %amount,
        "Flow order created"
    );
    Ok((
        StatusCode::CREATED,
        Json(FlowPaymentResponse {
            redirect_url: order.redirect_url(),
            token: order.token,
            flow_order: order.flow_order,
            amount,
        }),
    ))
}

/// GET `/flow/status/{token}` - Payment status as reported by Flow.
async fn payment_status(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let status = state.flow.payment_status(&token).await?;
    Ok(Json(serde_json::json!({
        "flow_order": status.flow_order,
        "commerce_order": status.commerce_order,
        "status": status.status,
        "approved": status.is_approved(),
        "amount": status.amount,
        "currency": status.currency,
        "payer": status.payer,
    })))
}

//! MercadoPago checkout routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use lendshop_integrations::PreferenceRequest;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::checkout::{self, CheckoutRequest};
use crate::AppState;
use crate::error::ApiResult;

/// Creates the MercadoPago routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/mercadopago/preferences", post(create_preference))
        .route("/mercadopago/status/{payment_id}", get(payment_status))
}

/// A created checkout preference.
#[derive(Debug, Serialize)]
pub struct PreferenceResponse {
    /// Preference id.
    pub preference_id: String,
    /// Production checkout URL.
    pub init_point: String,
    /// Sandbox checkout URL.
    pub sandbox_init_point: String,
    /// Amount charged.
    pub amount: Decimal,
}

/// POST `/mercadopago/preferences` - Create a checkout preference for an installment.
async fn create_preference(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> ApiResult<impl IntoResponse> {
    let target = checkout::resolve(&state, payload).await?;

    let base = state.config.gateways.public_base_url.trim_end_matches('/');
    let preference = state
        .mercadopago
        .create_preference(&PreferenceRequest {
            external_reference: target.installment_id.to_string(),
            title: target.subject(),
            amount: target.amount,
            payer_email: target.email.clone(),
            return_base_url: format!("{base}/payment-result"),
            notification_url: format!("{base}/api/v1/mercadopago/webhook"),
        })
        .await?;

    info!(
        installment_id = %target.installment_id,
        preference_id = %preference.id,
        amount = %target.amount,
        "MercadoPago preference created for installment"
    );
    Ok((
        StatusCode::CREATED,
        Json(PreferenceResponse {
            preference_id: preference.id,
            init_point: preference.init_point,
            sandbox_init_point: preference.sandbox_init_point,
            amount: target.amount,
        }),
    ))
}

/// GET `/mercadopago/status/{payment_id}` - Payment as reported by MercadoPago.
async fn payment_status(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let payment = state.mercadopago.get_payment(&payment_id).await?;
    Ok(Json(serde_json::json!({
        "id": payment.id,
        "status": payment.status,
        "approved": payment.is_approved(),
        "external_reference": payment.external_reference,
        "transaction_amount": payment.transaction_amount,
        "payer_email": payment.payer_email(),
    })))
}

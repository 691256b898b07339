//! Manual payment routes: record, void, and receipts.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use lendshop_core::cash::PaymentMethod;
use lendshop_db::repositories::{PaymentRepository, RecordPaymentInput, VoidPaymentInput};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Creates the payment routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(record_payment))
        .route("/payments/{id}", get(get_payment))
        .route("/payments/{id}/void", post(void_payment))
        .route("/payments/{id}/receipt", get(get_receipt))
}

/// Request body for a counter payment.
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    /// Installment being paid.
    pub installment_id: Uuid,
    /// Amount to collect.
    pub amount: Decimal,
    /// cash, card, yape or plin.
    pub method: PaymentMethod,
    /// Amount handed over, for cash change.
    pub amount_received: Option<Decimal>,
}

/// Request body for voiding a payment.
#[derive(Debug, Default, Deserialize)]
pub struct VoidPaymentRequest {
    /// Why the payment is voided.
    pub reason: Option<String>,
    /// Operator asking for the void.
    pub requested_by: Option<String>,
}

/// POST `/payments` - Record a manual payment.
async fn record_payment(
    State(state): State<AppState>,
    Json(payload): Json<RecordPaymentRequest>,
) -> ApiResult<impl IntoResponse> {
    if !payload.method.is_manual() {
        return Err(ApiError::validation(format!(
            "Method '{}' is only accepted through its gateway",
            payload.method
        )));
    }

    let repo = PaymentRepository::new((*state.db).clone(), state.default_late_fee_rate());
    let recorded = repo
        .record_payment(RecordPaymentInput::manual(
            payload.installment_id,
            payload.amount,
            payload.amount_received,
            payload.method,
            state.today(),
        ))
        .await?;

    Ok((StatusCode::CREATED, Json(recorded)))
}

/// GET `/payments/{id}` - Get a payment.
async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = PaymentRepository::new((*state.db).clone(), state.default_late_fee_rate());
    let payment = repo.get(id).await?;
    Ok(Json(payment))
}

/// POST `/payments/{id}/void` - Void a payment and restore the installment.
async fn void_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<VoidPaymentRequest>>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload.unwrap_or_default();
    let repo = PaymentRepository::new((*state.db).clone(), state.default_late_fee_rate());
    let voided = repo
        .void_payment(VoidPaymentInput {
            payment_id: id,
            reason: payload.reason,
            requested_by: payload.requested_by,
        })
        .await?;

    warn!(
        payment_id = %id,
        installment_id = %voided.installment.id,
        balance = %voided.installment.balance,
        "Payment voided"
    );
    Ok(Json(voided))
}

/// GET `/payments/{id}/receipt` - Receipt issued for a payment.
async fn get_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = PaymentRepository::new((*state.db).clone(), state.default_late_fee_rate());
    let receipt = repo.receipt(id).await?;
    info!(payment_id = %id, receipt = %receipt.display_number(), "Receipt fetched");
    Ok(Json(receipt))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    use crate::test_support::{body_json, default_state, send};

    #[tokio::test]
    async fn test_gateway_methods_are_not_recorded_by_hand() {
        let response = send(
            default_state(),
            Request::post("/api/v1/payments")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"installment_id":"6f1c2a9e-3b7d-4e21-9a43-2c5d8e7f0a11","amount":"50.00","method":"flow"}"#,
                ))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}

//! Installment routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use lendshop_db::repositories::{InstallmentRepository, PaymentRepository, SettingsRepository};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiResult;

/// Creates the installment routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/installments/overdue", get(list_overdue))
        .route("/installments/{id}", get(get_installment))
        .route("/installments/{id}/payments", get(list_payments))
}

/// GET `/installments/overdue` - Unpaid past-due installments with their fees.
async fn list_overdue(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let rate = SettingsRepository::new((*state.db).clone(), state.default_late_fee_rate())
        .late_fee_rate()
        .await?;
    let repo = InstallmentRepository::new((*state.db).clone());
    let overdue = repo.overdue(state.today(), rate).await?;
    Ok(Json(overdue))
}

/// GET `/installments/{id}` - Installment plus what is owed today.
async fn get_installment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let rate = SettingsRepository::new((*state.db).clone(), state.default_late_fee_rate())
        .late_fee_rate()
        .await?;
    let repo = InstallmentRepository::new((*state.db).clone());
    let installment = repo.get_with_quote(id, state.today(), rate).await?;
    Ok(Json(installment))
}

/// GET `/installments/{id}/payments` - Payment history, voided payments included.
async fn list_payments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    InstallmentRepository::new((*state.db).clone()).get(id).await?;
    let repo = PaymentRepository::new((*state.db).clone(), state.default_late_fee_rate());
    let payments = repo.history(id).await?;
    Ok(Json(payments))
}

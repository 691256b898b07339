//! Loan origination and lookup routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use lendshop_core::schedule::{Frequency, LoanLimits, LoanStatus};
use lendshop_db::repositories::{CreateLoanInput, LoanRepository};
use lendshop_shared::types::PageRequest;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiResult;

/// Creates the loan routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/loans", get(list_loans).post(create_loan))
        .route("/loans/{id}", get(get_loan))
        .route("/loans/{id}/cancel", post(cancel_loan))
}

/// Request body for originating a loan.
#[derive(Debug, Deserialize)]
pub struct CreateLoanRequest {
    /// Borrower.
    pub client_id: Uuid,
    /// Amount lent.
    pub principal: Decimal,
    /// Flat interest percentage; defaults to 0.
    #[serde(default)]
    pub interest_percent: Decimal,
    /// Number of installments.
    pub installments: u32,
    /// Installment frequency.
    pub frequency: Frequency,
    /// Origination date; defaults to today.
    pub start_date: Option<NaiveDate>,
}

/// Query parameters for listing loans.
#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    /// Filter by status.
    pub status: Option<LoanStatus>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

impl ListLoansQuery {
    fn page(&self) -> PageRequest {
        let default = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(default.page),
            per_page: self.per_page.unwrap_or(default.per_page),
        }
    }
}

/// POST `/loans` - Originate a loan with its schedule.
async fn create_loan(
    State(state): State<AppState>,
    Json(payload): Json<CreateLoanRequest>,
) -> ApiResult<impl IntoResponse> {
    let limits = LoanLimits::from(&state.config.lending);
    let input = CreateLoanInput {
        client_id: payload.client_id,
        principal: payload.principal,
        interest_percent: payload.interest_percent,
        installments: payload.installments,
        frequency: payload.frequency,
        start_date: payload.start_date.unwrap_or_else(|| state.today()),
    };

    let repo = LoanRepository::new((*state.db).clone());
    let loan = repo.create(input, &limits).await?;

    info!(
        loan_id = %loan.loan.id,
        client_id = %loan.loan.client_id,
        total = %loan.loan.total_amount,
        "Loan originated"
    );
    Ok((StatusCode::CREATED, Json(loan)))
}

/// GET `/loans` - List loans.
async fn list_loans(
    State(state): State<AppState>,
    Query(query): Query<ListLoansQuery>,
) -> ApiResult<impl IntoResponse> {
    let repo = LoanRepository::new((*state.db).clone());
    let loans = repo.list(query.status.map(Into::into), query.page()).await?;
    Ok(Json(loans))
}

/// GET `/loans/{id}` - Loan with its installments.
async fn get_loan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = LoanRepository::new((*state.db).clone());
    let loan = repo.get(id).await?;
    Ok(Json(loan))
}

/// POST `/loans/{id}/cancel` - Cancel a loan that has no payments.
async fn cancel_loan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = LoanRepository::new((*state.db).clone());
    let loan = repo.cancel(id).await?;
    info!(loan_id = %id, "Loan cancelled");
    Ok(Json(loan))
}

//! Loan repository for origination, lookup, and cancellation.

use chrono::{NaiveDate, Utc};
use lendshop_core::schedule::{
    AmortizationService, Frequency, LoanLimits, LoanTerms, ScheduleError,
};
use lendshop_shared::AppError;
use lendshop_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use super::is_unique_violation;
use crate::entities::{
    clients, installments, loans, payments,
    sea_orm_active_enums::{InstallmentStatus, LoanStatus, PaymentStatus},
};

/// Error types for loan operations.
#[derive(Debug, thiserror::Error)]
pub enum LoanError {
    /// Terms failed validation.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Client not found.
    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),

    /// The client already has an active loan.
    #[error("Client {0} already has an active loan")]
    ActiveLoanExists(Uuid),

    /// Loan not found.
    #[error("Loan not found: {0}")]
    NotFound(Uuid),

    /// Only active loans can be cancelled.
    #[error("Loan {0} is not active")]
    NotActive(Uuid),

    /// Loans with approved payments cannot be cancelled.
    #[error("Loan {0} has approved payments and cannot be cancelled")]
    HasPayments(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<LoanError> for AppError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::Schedule(e) => e.into(),
            LoanError::ClientNotFound(_) | LoanError::NotFound(_) => {
                Self::NotFound(err.to_string())
            }
            LoanError::ActiveLoanExists(_)
            | LoanError::NotActive(_)
            | LoanError::HasPayments(_) => Self::Validation(err.to_string()),
            LoanError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for originating a loan.
#[derive(Debug, Clone)]
pub struct CreateLoanInput {
    /// Borrower.
    pub client_id: Uuid,
    /// Amount lent.
    pub principal: Decimal,
    /// Flat interest percentage.
    pub interest_percent: Decimal,
    /// Number of installments.
    pub installments: u32,
    /// Installment frequency.
    pub frequency: Frequency,
    /// Origination date.
    pub start_date: NaiveDate,
}

/// A loan with its installments ordered by sequence.
#[derive(Debug, Clone, Serialize)]
pub struct LoanWithInstallments {
    /// The loan.
    #[serde(flatten)]
    pub loan: loans::Model,
    /// Its installments.
    pub installments: Vec<installments::Model>,
}

/// Loan repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct LoanRepository {
    db: DatabaseConnection,
}

impl LoanRepository {
    /// Creates a new loan repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Originates a loan and persists its schedule in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The terms break an origination rule
    /// - The client does not exist
    /// - The client already has an active loan
    /// - Database operation fails
    pub async fn create(
        &self,
        input: CreateLoanInput,
        limits: &LoanLimits,
    ) -> Result<LoanWithInstallments, LoanError> {
        let terms = LoanTerms {
            principal: input.principal,
            interest_percent: input.interest_percent,
            installments: input.installments,
            frequency: input.frequency,
            start_date: input.start_date,
        };
        let schedule = AmortizationService::generate_schedule(&terms, limits)?;
        let installment_count =
            i32::try_from(input.installments).map_err(|_| ScheduleError::TooManyInstallments {
                max: limits.max_installments,
            })?;

        let txn = self.db.begin().await?;

        clients::Entity::find_by_id(input.client_id)
            .one(&txn)
            .await?
            .ok_or(LoanError::ClientNotFound(input.client_id))?;

        let existing = loans::Entity::find()
            .filter(loans::Column::ClientId.eq(input.client_id))
            .filter(loans::Column::Status.eq(LoanStatus::Active))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(LoanError::ActiveLoanExists(input.client_id));
        }

        let now = Utc::now().into();
        let loan_id = Uuid::new_v4();
        let loan = loans::ActiveModel {
            id: Set(loan_id),
            client_id: Set(input.client_id),
            principal: Set(input.principal),
            interest_percent: Set(input.interest_percent),
            installment_count: Set(installment_count),
            frequency: Set(input.frequency.into()),
            start_date: Set(input.start_date),
            total_amount: Set(schedule.total_amount),
            installment_amount: Set(schedule.installment_amount),
            status: Set(LoanStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
            closed_at: Set(None),
        };
        let loan = loan.insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                LoanError::ActiveLoanExists(input.client_id)
            } else {
                e.into()
            }
        })?;

        let mut rows = Vec::with_capacity(schedule.installments.len());
        for item in &schedule.installments {
            let sequence = i32::try_from(item.sequence).map_err(|_| {
                ScheduleError::TooManyInstallments {
                    max: limits.max_installments,
                }
            })?;
            let row = installments::ActiveModel {
                id: Set(Uuid::new_v4()),
                loan_id: Set(loan_id),
                client_id: Set(input.client_id),
                sequence: Set(sequence),
                due_date: Set(item.due_date),
                amount: Set(item.amount),
                balance: Set(item.amount),
                status: Set(InstallmentStatus::Pending),
                is_paid: Set(false),
                paid_at: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            };
            rows.push(row.insert(&txn).await?);
        }

        txn.commit().await?;

        tracing::info!(
            loan_id = %loan.id,
            client_id = %loan.client_id,
            total = %loan.total_amount,
            installments = rows.len(),
            "Loan originated"
        );

        Ok(LoanWithInstallments {
            loan,
            installments: rows,
        })
    }

    /// Finds a loan with its installments.
    pub async fn get(&self, id: Uuid) -> Result<LoanWithInstallments, LoanError> {
        let loan = loans::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(LoanError::NotFound(id))?;
        self.with_installments(loan).await
    }

    /// Lists loans, optionally filtered by status, newest first.
    pub async fn list(
        &self,
        status: Option<LoanStatus>,
        page: PageRequest,
    ) -> Result<PageResponse<loans::Model>, LoanError> {
        let page = page.normalized();
        let mut query = loans::Entity::find();
        if let Some(status) = status {
            query = query.filter(loans::Column::Status.eq(status));
        }

        let total = query.clone().count(&self.db).await?;
        let data = query
            .order_by_desc(loans::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Lists every loan of a client, newest first.
    pub async fn list_for_client(&self, client_id: Uuid) -> Result<Vec<loans::Model>, LoanError> {
        let loans = loans::Entity::find()
            .filter(loans::Column::ClientId.eq(client_id))
            .order_by_desc(loans::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(loans)
    }

    /// The active loan of a client, if any, with its installments.
    pub async fn active_for_client(
        &self,
        client_id: Uuid,
    ) -> Result<Option<LoanWithInstallments>, LoanError> {
        let loan = loans::Entity::find()
            .filter(loans::Column::ClientId.eq(client_id))
            .filter(loans::Column::Status.eq(LoanStatus::Active))
            .one(&self.db)
            .await?;

        match loan {
            Some(loan) => Ok(Some(self.with_installments(loan).await?)),
            None => Ok(None),
        }
    }

    /// Cancels an active loan that has no approved payments.
    ///
    /// # Errors
    ///
    /// Returns an error if the loan does not exist, is not active, or has
    /// approved payments.
    pub async fn cancel(&self, id: Uuid) -> Result<loans::Model, LoanError> {
        let txn = self.db.begin().await?;

        let loan = loans::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(LoanError::NotFound(id))?;

        if loan.status != LoanStatus::Active {
            return Err(LoanError::NotActive(id));
        }

        let approved = payments::Entity::find()
            .filter(payments::Column::LoanId.eq(id))
            .filter(payments::Column::Status.eq(PaymentStatus::Approved))
            .count(&txn)
            .await?;
        if approved > 0 {
            return Err(LoanError::HasPayments(id));
        }

        let now = Utc::now().into();
        let mut active: loans::ActiveModel = loan.into();
        active.status = Set(LoanStatus::Cancelled);
        active.closed_at = Set(Some(now));
        active.updated_at = Set(now);
        let loan = active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(loan_id = %id, "Loan cancelled");
        Ok(loan)
    }

    async fn with_installments(
        &self,
        loan: loans::Model,
    ) -> Result<LoanWithInstallments, LoanError> {
        let installments = installments::Entity::find()
            .filter(installments::Column::LoanId.eq(loan.id))
            .order_by_asc(installments::Column::Sequence)
            .all(&self.db)
            .await?;
        Ok(LoanWithInstallments { loan, installments })
    }
}

//! Installment lookups with late-fee quotes.

use chrono::NaiveDate;
use lendshop_core::collection::{CollectionService, LateFeeQuote, LateFeeRate};
use lendshop_shared::AppError;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{installments, loans, sea_orm_active_enums::LoanStatus};

/// Error types for installment operations.
#[derive(Debug, thiserror::Error)]
pub enum InstallmentError {
    /// Installment not found.
    #[error("Installment not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<InstallmentError> for AppError {
    fn from(err: InstallmentError) -> Self {
        match err {
            InstallmentError::NotFound(_) => Self::NotFound(err.to_string()),
            InstallmentError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// An installment with its amounts due as of a date.
#[derive(Debug, Clone, Serialize)]
pub struct InstallmentWithQuote {
    /// The installment.
    #[serde(flatten)]
    pub installment: installments::Model,
    /// Balance, late fee, and total due.
    pub quote: LateFeeQuote,
}

impl InstallmentWithQuote {
    fn new(installment: installments::Model, today: NaiveDate, rate: LateFeeRate) -> Self {
        let quote = CollectionService::quote(&installment.state(), today, rate);
        Self { installment, quote }
    }
}

/// Installment repository.
#[derive(Debug, Clone)]
pub struct InstallmentRepository {
    db: DatabaseConnection,
}

impl InstallmentRepository {
    /// Creates a new installment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an installment by ID.
    pub async fn get(&self, id: Uuid) -> Result<installments::Model, InstallmentError> {
        installments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(InstallmentError::NotFound(id))
    }

    /// Finds an installment and quotes what is owed on `today`.
    pub async fn get_with_quote(
        &self,
        id: Uuid,
        today: NaiveDate,
        rate: LateFeeRate,
    ) -> Result<InstallmentWithQuote, InstallmentError> {
        let installment = self.get(id).await?;
        Ok(InstallmentWithQuote::new(installment, today, rate))
    }

    /// Unpaid installments of active loans that are past due on `today`,
    /// oldest first.
    pub async fn overdue(
        &self,
        today: NaiveDate,
        rate: LateFeeRate,
    ) -> Result<Vec<InstallmentWithQuote>, InstallmentError> {
        let rows = installments::Entity::find()
            .join(JoinType::InnerJoin, installments::Relation::Loans.def())
            .filter(loans::Column::Status.eq(LoanStatus::Active))
            .filter(installments::Column::IsPaid.eq(false))
            .filter(installments::Column::DueDate.lt(today))
            .order_by_asc(installments::Column::DueDate)
            .order_by_asc(installments::Column::Sequence)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| InstallmentWithQuote::new(row, today, rate))
            .collect())
    }
}

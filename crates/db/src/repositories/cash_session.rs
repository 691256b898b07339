//! Cash session repository for drawer open, summary, and close.

use chrono::Utc;
use lendshop_core::cash::{CashError, CashService, DrawerClose, DrawerSummary};
use lendshop_shared::types::{PageRequest, PageResponse};
use lendshop_shared::{AppError, ClosePolicy};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use super::is_unique_violation;
use crate::entities::{
    cash_sessions, payments,
    sea_orm_active_enums::{PaymentMethod, PaymentStatus},
};

/// Error types for cash session operations.
#[derive(Debug, thiserror::Error)]
pub enum CashSessionError {
    /// Drawer rule failed.
    #[error(transparent)]
    Invalid(#[from] CashError),

    /// A session is already open.
    #[error("A cash session is already open")]
    AlreadyOpen,

    /// No session is open.
    #[error("No cash session is open")]
    NoOpenSession,

    /// No session was ever opened.
    #[error("No cash session found")]
    NotFound,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CashSessionError> for AppError {
    fn from(err: CashSessionError) -> Self {
        match err {
            CashSessionError::Invalid(e) => e.into(),
            CashSessionError::AlreadyOpen | CashSessionError::NoOpenSession => {
                Self::Validation(err.to_string())
            }
            CashSessionError::NotFound => Self::NotFound(err.to_string()),
            CashSessionError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// An open session with its running totals.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// The session.
    pub session: cash_sessions::Model,
    /// Drawer position.
    pub summary: DrawerSummary,
}

/// A closed session with the reconciliation that closed it.
#[derive(Debug, Clone, Serialize)]
pub struct SessionClose {
    /// The session, now closed.
    pub session: cash_sessions::Model,
    /// Drawer position at close.
    pub summary: DrawerSummary,
    /// Counted against expected cash.
    pub reconciliation: DrawerClose,
}

/// Cash session repository.
#[derive(Debug, Clone)]
pub struct CashSessionRepository {
    db: DatabaseConnection,
}

impl CashSessionRepository {
    /// Creates a new cash session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens the drawer with an opening float.
    ///
    /// # Errors
    ///
    /// Returns an error if the float is negative or a session is already open.
    pub async fn open(
        &self,
        opening_float: Decimal,
        opened_by: Option<String>,
    ) -> Result<cash_sessions::Model, CashSessionError> {
        CashService::validate_opening_float(opening_float)?;

        if self.current().await?.is_some() {
            return Err(CashSessionError::AlreadyOpen);
        }

        let session = cash_sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            opened_at: Set(Utc::now().into()),
            opened_by: Set(opened_by),
            opening_float: Set(opening_float),
            is_open: Set(true),
            closed_at: Set(None),
            closed_by: Set(None),
            counted_cash: Set(None),
            expected_cash: Set(None),
            variance: Set(None),
            cash_total: Set(None),
            digital_total: Set(None),
        };

        // The partial unique index settles two concurrent opens
        let session = session.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                CashSessionError::AlreadyOpen
            } else {
                e.into()
            }
        })?;

        tracing::info!(session_id = %session.id, opening_float = %opening_float, "Cash session opened");
        Ok(session)
    }

    /// The open session, if any.
    pub async fn current(&self) -> Result<Option<cash_sessions::Model>, CashSessionError> {
        let session = cash_sessions::Entity::find()
            .filter(cash_sessions::Column::IsOpen.eq(true))
            .one(&self.db)
            .await?;
        Ok(session)
    }

    /// Summary of the open session.
    ///
    /// # Errors
    ///
    /// Returns `NoOpenSession` when sessions exist but none is open, and
    /// `NotFound` when no session was ever opened.
    pub async fn current_summary(&self) -> Result<SessionSummary, CashSessionError> {
        let Some(session) = self.current().await? else {
            let any = cash_sessions::Entity::find().count(&self.db).await?;
            return Err(if any == 0 {
                CashSessionError::NotFound
            } else {
                CashSessionError::NoOpenSession
            });
        };

        let summary = summarize(&self.db, &session).await?;
        Ok(SessionSummary { session, summary })
    }

    /// Closes the open session against the counted cash.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is open, the count is negative, or the
    /// policy rejects the variance.
    pub async fn close(
        &self,
        counted_cash: Decimal,
        policy: ClosePolicy,
        closed_by: Option<String>,
    ) -> Result<SessionClose, CashSessionError> {
        let txn = self.db.begin().await?;

        let session = cash_sessions::Entity::find()
            .filter(cash_sessions::Column::IsOpen.eq(true))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(CashSessionError::NoOpenSession)?;

        let summary = summarize(&txn, &session).await?;
        let reconciliation = CashService::reconcile(&summary, counted_cash, policy)?;

        let mut active: cash_sessions::ActiveModel = session.into();
        active.is_open = Set(false);
        active.closed_at = Set(Some(Utc::now().into()));
        active.closed_by = Set(closed_by);
        active.counted_cash = Set(Some(counted_cash));
        active.expected_cash = Set(Some(reconciliation.expected_cash));
        active.variance = Set(Some(reconciliation.variance));
        active.cash_total = Set(Some(summary.totals.cash));
        active.digital_total = Set(Some(summary.bank_total));
        let session = active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            session_id = %session.id,
            expected = %reconciliation.expected_cash,
            counted = %counted_cash,
            variance = %reconciliation.variance,
            "Cash session closed"
        );

        Ok(SessionClose {
            session,
            summary,
            reconciliation,
        })
    }

    /// Lists sessions, newest first.
    pub async fn list(
        &self,
        page: PageRequest,
    ) -> Result<PageResponse<cash_sessions::Model>, CashSessionError> {
        let page = page.normalized();
        let total = cash_sessions::Entity::find().count(&self.db).await?;
        let data = cash_sessions::Entity::find()
            .order_by_desc(cash_sessions::Column::OpenedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }
}

/// Totals the approved payments attached to a session.
async fn summarize<C: ConnectionTrait>(
    db: &C,
    session: &cash_sessions::Model,
) -> Result<DrawerSummary, DbErr> {
    let rows: Vec<(PaymentMethod, Decimal, Decimal)> = payments::Entity::find()
        .select_only()
        .column(payments::Column::Method)
        .column(payments::Column::Amount)
        .column(payments::Column::Overpayment)
        .filter(payments::Column::CashSessionId.eq(session.id))
        .filter(payments::Column::Status.eq(PaymentStatus::Approved))
        .into_tuple()
        .all(db)
        .await?;

    Ok(CashService::summarize(
        session.opening_float,
        rows.into_iter()
            .map(|(method, amount, overpayment)| (method.into(), amount + overpayment)),
    ))
}

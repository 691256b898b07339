//! Payment repository for collecting and voiding installment payments.
//!
//! Every write runs in one database transaction with the installment row
//! locked (`SELECT ... FOR UPDATE`), so concurrent payments against the same
//! installment serialize instead of racing on the balance.

use chrono::{NaiveDate, Utc};
use lendshop_core::cash::{CashService, PaymentMethod};
use lendshop_core::client::ReceiptKind;
use lendshop_core::collection::{
    CollectionError, CollectionService, InstallmentStatus as DomainInstallmentStatus, LateFeeRate,
    Settlement,
};
use lendshop_core::schedule::LoanStatus as DomainLoanStatus;
use lendshop_shared::AppError;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use super::is_unique_violation;
use super::settings::current_rate;
use crate::entities::{
    cash_sessions, clients, installments, loans, payments, receipts,
    sea_orm_active_enums::{self as db_enums, LoanStatus, PaymentStatus},
};

/// Error types for payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Allocation or reversal rule failed.
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    NotFound(Uuid),

    /// Installment not found.
    #[error("Installment not found: {0}")]
    InstallmentNotFound(Uuid),

    /// Receipt not found.
    #[error("Receipt not found for payment {0}")]
    ReceiptNotFound(Uuid),

    /// Payments are only accepted on active loans.
    #[error("Loan {0} is not active")]
    LoanNotActive(Uuid),

    /// Cash payments need an open drawer.
    #[error("No open cash session; open the drawer before taking cash")]
    NoOpenCashSession,

    /// The gateway payment was already registered.
    #[error("Payment {reference} via {method} is already registered")]
    Duplicate {
        /// Payment method.
        method: PaymentMethod,
        /// Gateway reference.
        reference: String,
    },

    /// Voiding twice is not allowed.
    #[error("Payment {0} is already voided")]
    AlreadyVoided(Uuid),

    /// Re-opening the loan would give the client two active loans.
    #[error("Client {0} has another active loan; the paid loan cannot be re-opened")]
    ActiveLoanConflict(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Collection(e) => e.into(),
            PaymentError::NotFound(_)
            | PaymentError::InstallmentNotFound(_)
            | PaymentError::ReceiptNotFound(_) => Self::NotFound(err.to_string()),
            PaymentError::LoanNotActive(_)
            | PaymentError::NoOpenCashSession
            | PaymentError::AlreadyVoided(_) => Self::Validation(err.to_string()),
            PaymentError::Duplicate { .. } | PaymentError::ActiveLoanConflict(_) => {
                Self::Conflict(err.to_string())
            }
            PaymentError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct RecordPaymentInput {
    /// Installment being paid.
    pub installment_id: Uuid,
    /// Amount to collect.
    pub amount: Decimal,
    /// Amount handed over; defaults to `amount`.
    pub amount_received: Option<Decimal>,
    /// Payment method.
    pub method: PaymentMethod,
    /// Gateway reference, unique per method.
    pub external_reference: Option<String>,
    /// Payer email reported by the gateway.
    pub payer_email: Option<String>,
    /// Shop calendar date used for the late fee.
    pub today: NaiveDate,
}

impl RecordPaymentInput {
    /// A manual payment taken at the counter.
    #[must_use]
    pub const fn manual(
        installment_id: Uuid,
        amount: Decimal,
        amount_received: Option<Decimal>,
        method: PaymentMethod,
        today: NaiveDate,
    ) -> Self {
        Self {
            installment_id,
            amount,
            amount_received,
            method,
            external_reference: None,
            payer_email: None,
            today,
        }
    }
}

/// A recorded payment with everything it touched.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedPayment {
    /// The payment row.
    pub payment: payments::Model,
    /// The installment after the payment.
    pub installment: installments::Model,
    /// The issued receipt.
    pub receipt: receipts::Model,
    /// How the amount was allocated.
    pub settlement: Settlement,
    /// Loan status after the payment.
    pub loan_status: LoanStatus,
}

/// Input for voiding a payment.
#[derive(Debug, Clone)]
pub struct VoidPaymentInput {
    /// Payment to void.
    pub payment_id: Uuid,
    /// Reason given by the operator.
    pub reason: Option<String>,
    /// Operator who asked for the void.
    pub requested_by: Option<String>,
}

/// A voided payment and the restored installment.
#[derive(Debug, Clone, Serialize)]
pub struct VoidedPayment {
    /// The payment row, now voided.
    pub payment: payments::Model,
    /// The installment with its balance restored.
    pub installment: installments::Model,
    /// Loan status after the void.
    pub loan_status: LoanStatus,
}

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
    default_rate: LateFeeRate,
}

impl PaymentRepository {
    /// Creates a payment repository; `default_rate` applies while no
    /// late-fee rate has been set.
    #[must_use]
    pub const fn new(db: DatabaseConnection, default_rate: LateFeeRate) -> Self {
        Self { db, default_rate }
    }

    /// Records a payment against an installment.
    ///
    /// Computes the late fee with the current rate, allocates the amount,
    /// updates the installment and loan, and issues a receipt, all in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not positive, not in whole cents, or above the
    ///   amount received
    /// - The installment does not exist or is already paid
    /// - The loan is not active
    /// - A cash payment is taken with no open drawer
    /// - The gateway reference was already registered
    pub async fn record_payment(
        &self,
        input: RecordPaymentInput,
    ) -> Result<RecordedPayment, PaymentError> {
        CollectionService::validate_amount(input.amount)?;
        let amount_received = input.amount_received.unwrap_or(input.amount);
        CollectionService::validate_amount(amount_received)?;
        if amount_received < input.amount {
            return Err(CollectionError::InsufficientCashReceived {
                received: amount_received,
                amount: input.amount,
            }
            .into());
        }

        if let Some(reference) = &input.external_reference {
            if self
                .find_by_external_reference(input.method, reference)
                .await?
                .is_some()
            {
                return Err(PaymentError::Duplicate {
                    method: input.method,
                    reference: reference.clone(),
                });
            }
        }

        let txn = self.db.begin().await?;

        let installment = installments::Entity::find_by_id(input.installment_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PaymentError::InstallmentNotFound(input.installment_id))?;

        let loan = loans::Entity::find_by_id(installment.loan_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PaymentError::InstallmentNotFound(input.installment_id))?;
        if loan.status != LoanStatus::Active {
            return Err(PaymentError::LoanNotActive(loan.id));
        }

        let rate = current_rate(&txn, self.default_rate).await?;
        let fee = CollectionService::late_fee(&installment.state(), input.today, rate);
        let settlement = CollectionService::allocate(input.amount, installment.balance, fee)?;

        let session = cash_sessions::Entity::find()
            .filter(cash_sessions::Column::IsOpen.eq(true))
            .lock_shared()
            .one(&txn)
            .await?;
        if input.method.is_cash() && session.is_none() {
            return Err(PaymentError::NoOpenCashSession);
        }

        let now = Utc::now().into();
        let collected = settlement.amount_collected();
        let excess = CashService::split_excess(input.method, amount_received - collected);
        let payment = payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            installment_id: Set(installment.id),
            loan_id: Set(loan.id),
            client_id: Set(loan.client_id),
            cash_session_id: Set(session.map(|s| s.id)),
            method: Set(input.method.into()),
            status: Set(PaymentStatus::Approved),
            settlement: Set(settlement.kind.into()),
            amount: Set(collected),
            amount_received: Set(amount_received),
            change_given: Set(excess.change),
            overpayment: Set(excess.overpayment),
            principal_applied: Set(settlement.principal_applied),
            fee_applied: Set(settlement.fee_applied),
            fee_waived: Set(settlement.fee_waived),
            late_fee_rate: Set(rate.percent()),
            balance_before: Set(settlement.balance_before),
            balance_after: Set(settlement.balance_after),
            external_reference: Set(input.external_reference.clone()),
            payer_email: Set(input.payer_email.clone()),
            paid_at: Set(now),
            voided_at: Set(None),
            void_reason: Set(None),
            voided_by: Set(None),
        };
        let payment = payment.insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                PaymentError::Duplicate {
                    method: input.method,
                    reference: input.external_reference.clone().unwrap_or_default(),
                }
            } else {
                e.into()
            }
        })?;

        let status = DomainInstallmentStatus::derive(settlement.balance_after, installment.amount);
        let mut active: installments::ActiveModel = installment.into();
        active.balance = Set(settlement.balance_after);
        active.status = Set(status.into());
        active.is_paid = Set(settlement.is_paid());
        if settlement.is_paid() {
            active.paid_at = Set(Some(now));
        }
        active.updated_at = Set(now);
        let installment = active.update(&txn).await?;

        let loan_status = if settlement.is_paid() {
            refresh_loan_status(&txn, loan).await?
        } else {
            loan.status
        };

        let receipt = issue_receipt(&txn, &payment, &installment).await?;

        txn.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            installment_id = %installment.id,
            method = %input.method,
            amount = %payment.amount,
            balance = %installment.balance,
            receipt = %receipt.display_number(),
            "Payment recorded"
        );

        Ok(RecordedPayment {
            payment,
            installment,
            receipt,
            settlement,
            loan_status,
        })
    }

    /// Voids an approved payment and restores the installment balance.
    ///
    /// A paid loan goes back to active when the restored installment is no
    /// longer paid.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment does not exist or is already voided,
    /// or if re-opening the loan would give the client two active loans.
    pub async fn void_payment(
        &self,
        input: VoidPaymentInput,
    ) -> Result<VoidedPayment, PaymentError> {
        let txn = self.db.begin().await?;

        let payment = payments::Entity::find_by_id(input.payment_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PaymentError::NotFound(input.payment_id))?;
        if payment.status == PaymentStatus::Voided {
            return Err(PaymentError::AlreadyVoided(payment.id));
        }

        let installment = installments::Entity::find_by_id(payment.installment_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PaymentError::InstallmentNotFound(payment.installment_id))?;

        let loan = loans::Entity::find_by_id(payment.loan_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PaymentError::InstallmentNotFound(payment.installment_id))?;

        let reversal = CollectionService::reverse(
            installment.amount,
            installment.balance,
            payment.balance_before,
            payment.balance_after,
        )?;
        let reopened = reversal.status != DomainInstallmentStatus::Paid;

        let now = Utc::now().into();
        let loan_status = if loan.status == LoanStatus::Paid && reopened {
            let other_active = loans::Entity::find()
                .filter(loans::Column::ClientId.eq(loan.client_id))
                .filter(loans::Column::Status.eq(LoanStatus::Active))
                .filter(loans::Column::Id.ne(loan.id))
                .one(&txn)
                .await?;
            if other_active.is_some() {
                return Err(PaymentError::ActiveLoanConflict(loan.client_id));
            }

            let mut active: loans::ActiveModel = loan.into();
            active.status = Set(LoanStatus::Active);
            active.closed_at = Set(None);
            active.updated_at = Set(now);
            active.update(&txn).await?.status
        } else {
            loan.status
        };

        let mut active: installments::ActiveModel = installment.into();
        active.balance = Set(reversal.restored_balance);
        active.status = Set(reversal.status.into());
        active.is_paid = Set(!reopened);
        if reopened {
            active.paid_at = Set(None);
        }
        active.updated_at = Set(now);
        let installment = active.update(&txn).await?;

        let mut active: payments::ActiveModel = payment.into();
        active.status = Set(PaymentStatus::Voided);
        active.voided_at = Set(Some(now));
        active.void_reason = Set(input.reason);
        active.voided_by = Set(input.requested_by);
        let payment = active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            installment_id = %installment.id,
            restored_balance = %installment.balance,
            "Payment voided"
        );

        Ok(VoidedPayment {
            payment,
            installment,
            loan_status,
        })
    }

    /// Finds a payment by ID.
    pub async fn get(&self, id: Uuid) -> Result<payments::Model, PaymentError> {
        payments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(PaymentError::NotFound(id))
    }

    /// Payments of an installment, newest first, voided ones included.
    pub async fn history(&self, installment_id: Uuid) -> Result<Vec<payments::Model>, PaymentError> {
        let rows = payments::Entity::find()
            .filter(payments::Column::InstallmentId.eq(installment_id))
            .order_by_desc(payments::Column::PaidAt)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Receipt issued for a payment.
    pub async fn receipt(&self, payment_id: Uuid) -> Result<receipts::Model, PaymentError> {
        receipts::Entity::find()
            .filter(receipts::Column::PaymentId.eq(payment_id))
            .one(&self.db)
            .await?
            .ok_or(PaymentError::ReceiptNotFound(payment_id))
    }

    /// Finds a gateway payment by its reference.
    pub async fn find_by_external_reference(
        &self,
        method: PaymentMethod,
        reference: &str,
    ) -> Result<Option<payments::Model>, PaymentError> {
        let method: db_enums::PaymentMethod = method.into();
        let payment = payments::Entity::find()
            .filter(payments::Column::Method.eq(method))
            .filter(payments::Column::ExternalReference.eq(reference))
            .one(&self.db)
            .await?;
        Ok(payment)
    }
}

/// Marks the loan paid once every installment balance is zero.
async fn refresh_loan_status(
    txn: &DatabaseTransaction,
    loan: loans::Model,
) -> Result<LoanStatus, DbErr> {
    let balances: Vec<Decimal> = installments::Entity::find()
        .select_only()
        .column(installments::Column::Balance)
        .filter(installments::Column::LoanId.eq(loan.id))
        .into_tuple()
        .all(txn)
        .await?;

    if DomainLoanStatus::from_balances(balances) != DomainLoanStatus::Paid {
        return Ok(loan.status);
    }

    let now = Utc::now().into();
    let loan_id = loan.id;
    let mut active: loans::ActiveModel = loan.into();
    active.status = Set(LoanStatus::Paid);
    active.closed_at = Set(Some(now));
    active.updated_at = Set(now);
    let loan = active.update(txn).await?;

    tracing::info!(loan_id = %loan_id, "Loan fully paid");
    Ok(loan.status)
}

/// Issues the receipt for a payment, snapshotting the client details.
async fn issue_receipt<C: ConnectionTrait>(
    db: &C,
    payment: &payments::Model,
    installment: &installments::Model,
) -> Result<receipts::Model, DbErr> {
    let client = clients::Entity::find_by_id(payment.client_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("client {}", payment.client_id)))?;

    let kind = ReceiptKind::for_document(&client.document_number);
    let receipt = receipts::ActiveModel {
        id: Set(Uuid::new_v4()),
        payment_id: Set(payment.id),
        kind: Set(kind.into()),
        series: Set(kind.series().to_string()),
        client_name: Set(client.full_name),
        document_type: Set(client.document_type),
        document_number: Set(client.document_number),
        client_email: Set(payment.payer_email.clone().or(client.email)),
        installment_sequence: Set(installment.sequence),
        method: Set(payment.method),
        amount: Set(payment.amount),
        principal_applied: Set(payment.principal_applied),
        fee_applied: Set(payment.fee_applied),
        issued_at: Set(payment.paid_at),
        ..Default::default()
    };
    receipt.insert(db).await
}

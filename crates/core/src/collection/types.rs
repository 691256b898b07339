//! Collection domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::CollectionError;

/// Late-fee percentage applied to an overdue balance.
///
/// The rate is passed explicitly into every fee computation, and every
/// payment stores the rate it was settled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LateFeeRate(Decimal);

impl LateFeeRate {
    /// Creates a rate from a percentage.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::InvalidRate` outside `0..=100`.
    pub fn new(percent: Decimal) -> Result<Self, CollectionError> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(CollectionError::InvalidRate(percent));
        }
        Ok(Self(percent))
    }

    /// The rate as a percentage (1 means 1%).
    #[must_use]
    pub const fn percent(self) -> Decimal {
        self.0
    }
}

impl Default for LateFeeRate {
    fn default() -> Self {
        Self(Decimal::ONE)
    }
}

/// Installment status derived from its balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    /// Nothing collected yet.
    Pending,
    /// Some principal collected.
    Partial,
    /// Balance is zero.
    Paid,
}

impl InstallmentStatus {
    /// Derives the status from the remaining and nominal amounts.
    #[must_use]
    pub fn derive(balance: Decimal, amount: Decimal) -> Self {
        if balance <= Decimal::ZERO {
            Self::Paid
        } else if balance >= amount {
            Self::Pending
        } else {
            Self::Partial
        }
    }
}

/// The parts of an installment the collection rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallmentState {
    /// Nominal amount.
    pub amount: Decimal,
    /// Remaining balance.
    pub balance: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
}

impl InstallmentState {
    /// Whether the installment is fully paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.balance <= Decimal::ZERO
    }

    /// Whether the installment is unpaid and its due date has passed.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_paid() && self.due_date < today
    }
}

/// Amount owed on an installment as of a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LateFeeQuote {
    /// Remaining balance.
    pub balance: Decimal,
    /// Late fee at the quoted rate.
    pub late_fee: Decimal,
    /// Balance plus late fee.
    pub total_due: Decimal,
    /// Whether the due date has passed.
    pub is_overdue: bool,
    /// Days since the due date, zero when not overdue.
    pub days_overdue: i64,
    /// Rate used for the fee.
    pub rate_percent: Decimal,
}

/// Which allocation rule a payment fell under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementKind {
    /// The amount covered balance plus fee within tolerance.
    Full,
    /// Anything less; the fee is waived for this payment.
    Partial,
}

/// Outcome of allocating a received amount to an installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settlement {
    /// Allocation rule used.
    pub kind: SettlementKind,
    /// Amount handed over.
    pub amount_received: Decimal,
    /// Late fee collected.
    pub fee_applied: Decimal,
    /// Late fee forgiven.
    pub fee_waived: Decimal,
    /// Principal collected.
    pub principal_applied: Decimal,
    /// Part of the amount received that was not collected.
    pub change: Decimal,
    /// Balance before the payment.
    pub balance_before: Decimal,
    /// Balance after the payment, after any write-off.
    pub balance_after: Decimal,
    /// Residual balance cleared by the paid tolerance.
    pub written_off: Decimal,
}

impl Settlement {
    /// Fee plus principal actually collected.
    #[must_use]
    pub fn amount_collected(&self) -> Decimal {
        self.fee_applied + self.principal_applied
    }

    /// Whether the installment is paid after this settlement.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.balance_after.is_zero()
    }
}

/// Outcome of reversing a voided payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reversal {
    /// Balance after restoring the payment.
    pub restored_balance: Decimal,
    /// Status derived from the restored balance.
    pub status: InstallmentStatus,
}

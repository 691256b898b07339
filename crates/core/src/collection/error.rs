//! Collection error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by fee, allocation, and reversal rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectionError {
    /// Payment amount must be greater than zero.
    #[error("Payment amount must be greater than zero")]
    NonPositiveAmount,

    /// Payment amounts are whole cents.
    #[error("{0} has more than two decimal places")]
    SubCentAmount(Decimal),

    /// The installment has no balance left.
    #[error("Installment is already paid")]
    AlreadyPaid,

    /// Amount received is lower than the amount being collected.
    #[error("Amount received {received} is lower than the amount collected {amount}")]
    InsufficientCashReceived {
        /// Amount handed over by the client.
        received: Decimal,
        /// Amount the operator wants to collect.
        amount: Decimal,
    },

    /// Late-fee rate outside 0..=100 percent.
    #[error("Late-fee rate must be between 0 and 100 percent, got {0}")]
    InvalidRate(Decimal),

    /// Restoring the balance would exceed the installment amount.
    #[error("Restored balance {restored} exceeds installment amount {amount}")]
    ReversalOverflow {
        /// Balance after the reversal.
        restored: Decimal,
        /// Nominal installment amount.
        amount: Decimal,
    },
}

impl From<CollectionError> for lendshop_shared::AppError {
    fn from(err: CollectionError) -> Self {
        match err {
            CollectionError::ReversalOverflow { .. } => Self::Conflict(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}

//! Schedule error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while validating loan terms or building a schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// Principal must be greater than zero.
    #[error("Principal must be greater than zero")]
    NonPositivePrincipal,

    /// Interest percentage cannot be negative.
    #[error("Interest percentage cannot be negative")]
    NegativeInterest,

    /// Principal or interest carries digits below the cent.
    #[error("{0} has more than two decimal places")]
    SubCentAmount(Decimal),

    /// A loan needs at least one installment.
    #[error("A loan needs at least one installment")]
    NoInstallments,

    /// Principal is above the configured ceiling.
    #[error("Principal exceeds the maximum of {max}")]
    PrincipalAboveLimit {
        /// Configured ceiling.
        max: Decimal,
    },

    /// Installment count is above the configured ceiling.
    #[error("Installment count exceeds the maximum of {max}")]
    TooManyInstallments {
        /// Configured ceiling.
        max: u32,
    },

    /// Interest percentage is above the configured ceiling.
    #[error("Interest percentage exceeds the maximum of {max}")]
    InterestAboveLimit {
        /// Configured ceiling.
        max: Decimal,
    },

    /// The loan total does not fit in a decimal.
    #[error("Loan total is too large")]
    AmountOverflow,

    /// The total is too small to split into this many installments.
    #[error("Total {total} is too small to split into {installments} installments")]
    AmountTooSmall {
        /// Loan total.
        total: Decimal,
        /// Requested installment count.
        installments: u32,
    },

    /// A due date fell outside the supported calendar range.
    #[error("Due date out of range for installment {0}")]
    DateOutOfRange(u32),
}

impl From<ScheduleError> for lendshop_shared::AppError {
    fn from(err: ScheduleError) -> Self {
        Self::Validation(err.to_string())
    }
}

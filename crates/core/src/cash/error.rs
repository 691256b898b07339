//! Cash drawer error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Cash drawer errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CashError {
    /// Opening float cannot be negative.
    #[error("Opening float cannot be negative")]
    NegativeOpeningFloat,

    /// Counted cash cannot be negative.
    #[error("Counted cash cannot be negative")]
    NegativeCount,

    /// Drawer amounts are whole cents.
    #[error("{0} has more than two decimal places")]
    SubCentAmount(Decimal),

    /// Counted cash does not match the expected drawer cash.
    #[error("Counted cash {counted} does not match expected {expected} (variance {variance})")]
    VarianceNotZero {
        /// Expected drawer cash.
        expected: Decimal,
        /// Cash physically counted.
        counted: Decimal,
        /// Counted minus expected.
        variance: Decimal,
    },
}

impl From<CashError> for lendshop_shared::AppError {
    fn from(err: CashError) -> Self {
        match err {
            CashError::VarianceNotZero {
                expected,
                counted,
                variance,
            } => Self::Rejected {
                message: err.to_string(),
                details: serde_json::json!({
                    "expected": expected,
                    "counted": counted,
                    "variance": variance,
                }),
            },
            _ => Self::Validation(err.to_string()),
        }
    }
}

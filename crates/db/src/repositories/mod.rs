//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod cash_session;
pub mod client;
pub mod installment;
pub mod loan;
pub mod payment;
pub mod settings;

pub use cash_session::{CashSessionError, CashSessionRepository, SessionClose, SessionSummary};
pub use client::{ClientRepoError, ClientRepository};
pub use installment::{InstallmentError, InstallmentRepository, InstallmentWithQuote};
pub use loan::{CreateLoanInput, LoanError, LoanRepository, LoanWithInstallments};
pub use payment::{
    PaymentError, PaymentRepository, RecordPaymentInput, RecordedPayment, VoidPaymentInput,
    VoidedPayment,
};
pub use settings::SettingsRepository;

use sea_orm::{DbErr, SqlErr};

/// Whether a database error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

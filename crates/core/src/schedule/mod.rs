//! Loan origination and amortization schedules.
//!
//! This module turns loan terms into an ordered list of installments:
//! - Frequency stepping for due dates
//! - Origination limits
//! - Per-installment amounts with the rounding remainder on the last one

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::ScheduleError;
pub use service::AmortizationService;
pub use types::{Frequency, LoanLimits, LoanStatus, LoanTerms, Schedule, ScheduledInstallment};

//! Late fees, payment allocation, and void reversal.
//!
//! This module implements the settlement arithmetic for a single installment:
//! - Late-fee quotes at an explicit rate
//! - Full and partial settlement allocation
//! - Reversal of a voided payment

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::CollectionError;
pub use service::{CollectionService, FULL_SETTLEMENT_TOLERANCE, PAID_TOLERANCE};
pub use types::{
    InstallmentState, InstallmentStatus, LateFeeQuote, LateFeeRate, Reversal, Settlement,
    SettlementKind,
};

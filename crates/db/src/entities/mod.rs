//! `SeaORM` entity definitions.
//!
//! Entities mirror the tables created by the initial migration.

#![allow(missing_docs)]

pub mod prelude;

pub mod cash_sessions;
pub mod clients;
pub mod installments;
pub mod late_fee_rates;
pub mod loans;
pub mod payments;
pub mod receipts;
pub mod sea_orm_active_enums;

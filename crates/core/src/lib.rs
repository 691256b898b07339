//! Core business logic for Lendshop.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `schedule` - Loan origination limits and amortization schedules
//! - `collection` - Late fees, payment allocation, and void reversal
//! - `cash` - Cash-drawer summaries and close reconciliation
//! - `client` - Client documents, names, and receipt series

pub mod cash;
pub mod client;
pub mod collection;
pub mod schedule;

//! `SeaORM` entity prelude.

pub use super::cash_sessions::Entity as CashSessions;
pub use super::clients::Entity as Clients;
pub use super::installments::Entity as Installments;
pub use super::late_fee_rates::Entity as LateFeeRates;
pub use super::loans::Entity as Loans;
pub use super::payments::Entity as Payments;
pub use super::receipts::Entity as Receipts;

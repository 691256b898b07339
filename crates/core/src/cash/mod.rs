//! Cash-drawer summaries and close reconciliation.

pub mod error;
pub mod service;
pub mod types;

pub use error::CashError;
pub use service::CashService;
pub use types::{
    CloseOutcome, DrawerClose, DrawerSummary, ExcessSplit, MethodTotals, PaymentMethod,
};

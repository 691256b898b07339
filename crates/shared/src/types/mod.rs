//! Common types used across the application.

pub mod money;
pub mod pagination;

pub use money::{CURRENCY, is_cents, round2};
pub use pagination::{PageMeta, PageRequest, PageResponse};

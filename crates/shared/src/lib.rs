//! Shared types, errors, and configuration for Lendshop.
//!
//! This crate provides common types used across all other crates:
//! - Money rounding helpers with decimal precision
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AppConfig, AuthConfig, CashConfig, ClosePolicy, DatabaseConfig, FlowConfig, GatewayConfig,
    IdentityConfig, LendingConfig, MercadoPagoConfig, ServerConfig,
};
pub use error::{AppError, AppResult};

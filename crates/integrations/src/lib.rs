//! Outbound HTTP integrations for Lendshop.
//!
//! Every external service sits behind an async trait so the API layer can be
//! exercised with fakes:
//! - `flow` - Flow checkout orders and payment status (HMAC-signed)
//! - `mercadopago` - MercadoPago checkout preferences and payments
//! - `identity` - DNI/RUC lookup with an in-memory cache

pub mod error;
pub mod flow;
pub mod identity;
pub mod mercadopago;

pub use error::IntegrationError;
pub use flow::{
    FLOW_STATUS_APPROVED, FlowClient, FlowGateway, FlowOrder, FlowOrderRequest, FlowPaymentStatus,
    FlowSigner,
};
pub use identity::{IdentityClient, IdentityLookup, IdentityRecord};
pub use mercadopago::{
    MercadoPagoClient, MercadoPagoGateway, MercadoPagoPayment, Preference, PreferenceRequest,
};

//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Operator token middleware
//! - The JSON error envelope

pub mod error;
pub mod middleware;
pub mod routes;

#[cfg(test)]
mod test_support;

use axum::Router;
use chrono::NaiveDate;
use lendshop_core::collection::LateFeeRate;
use lendshop_integrations::{FlowGateway, IdentityLookup, MercadoPagoGateway};
use lendshop_shared::AppConfig;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Flow checkout client.
    pub flow: Arc<dyn FlowGateway>,
    /// MercadoPago checkout client.
    pub mercadopago: Arc<dyn MercadoPagoGateway>,
    /// DNI/RUC lookup client.
    pub identity: Arc<dyn IdentityLookup>,
}

impl AppState {
    /// Calendar date in the shop's time zone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.config.lending.today()
    }

    /// Late-fee rate used while no rate has been set.
    #[must_use]
    pub fn default_late_fee_rate(&self) -> LateFeeRate {
        LateFeeRate::new(self.config.lending.default_late_fee_percent).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid default late-fee rate, using 1%");
            LateFeeRate::default()
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

//! Lendshop API Server
//!
//! Main entry point for the loan-shop back-office service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lendshop_api::{AppState, create_router};
use lendshop_db::connect_with;
use lendshop_integrations::{FlowClient, IdentityClient, MercadoPagoClient};
use lendshop_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lendshop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database
    let db = connect_with(&config.database).await?;
    info!(max_connections = config.database.max_connections, "Connected to database");

    // Gateway and lookup clients
    let timeout = Duration::from_secs(config.gateways.request_timeout_secs);
    let flow = FlowClient::new(&config.gateways.flow, timeout)?;
    let mercadopago = MercadoPagoClient::new(&config.gateways.mercadopago, timeout)?;
    let identity = IdentityClient::new(&config.identity)?;
    info!(
        flow_sandbox = config.gateways.flow.sandbox,
        public_base_url = %config.gateways.public_base_url,
        "Payment gateways configured"
    );

    if config.auth.operator_token.as_deref().is_none_or(str::is_empty) {
        warn!("No operator token configured; back-office routes are open");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        config: Arc::new(config),
        flow: Arc::new(flow),
        mercadopago: Arc::new(mercadopago),
        identity: Arc::new(identity),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod cash_sessions;
mod checkout;
pub mod clients;
pub mod flow;
pub mod health;
pub mod installments;
pub mod loans;
pub mod mercadopago;
pub mod payments;
pub mod settings;
pub mod webhooks;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require the operator token
    let protected_routes = Router::new()
        .merge(clients::routes())
        .merge(loans::routes())
        .merge(installments::routes())
        .merge(payments::routes())
        .merge(cash_sessions::routes())
        .merge(settings::routes())
        .merge(flow::routes())
        .merge(mercadopago::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Gateways call the webhooks without a token
    Router::new()
        .merge(health::routes())
        .merge(webhooks::routes())
        .merge(protected_routes)
}

//! Fakes and state builders shared by the route tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request, response::Response};
use lendshop_core::client::DocumentType;
use lendshop_integrations::{
    FlowGateway, FlowOrder, FlowOrderRequest, FlowPaymentStatus, IdentityLookup, IdentityRecord,
    IntegrationError, MercadoPagoGateway, MercadoPagoPayment, Preference, PreferenceRequest,
};
use lendshop_shared::{
    AppConfig, AuthConfig, CashConfig, DatabaseConfig, GatewayConfig, IdentityConfig,
    LendingConfig, ServerConfig,
};
use sea_orm::DatabaseConnection;
use tower::ServiceExt;

use crate::{AppState, create_router};

/// Flow fake that records calls and answers with a fixed status.
#[derive(Default)]
pub struct FakeFlow {
    pub status: Option<FlowPaymentStatus>,
    pub status_calls: Mutex<Vec<String>>,
}

#[async_trait]
impl FlowGateway for FakeFlow {
    async fn create_order(&self, request: &FlowOrderRequest) -> Result<FlowOrder, IntegrationError> {
        Ok(FlowOrder {
            url: "https://sandbox.flow.cl/app/web/pay.php".into(),
            token: format!("tok-{}", request.commerce_order),
            flow_order: 1001,
        })
    }

    async fn payment_status(&self, token: &str) -> Result<FlowPaymentStatus, IntegrationError> {
        self.status_calls
            .lock()
            .expect("lock poisoned")
            .push(token.to_string());
        self.status
            .clone()
            .ok_or(IntegrationError::NotConfigured("Flow"))
    }
}

/// MercadoPago fake that answers with a fixed payment.
#[derive(Default)]
pub struct FakeMercadoPago {
    pub payment: Option<MercadoPagoPayment>,
}

#[async_trait]
impl MercadoPagoGateway for FakeMercadoPago {
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<Preference, IntegrationError> {
        Ok(Preference {
            id: format!("pref-{}", request.external_reference),
            init_point: "https://www.mercadopago.com.pe/checkout".into(),
            sandbox_init_point: "https://sandbox.mercadopago.com.pe/checkout".into(),
        })
    }

    async fn get_payment(&self, _payment_id: &str) -> Result<MercadoPagoPayment, IntegrationError> {
        self.payment
            .clone()
            .ok_or(IntegrationError::NotConfigured("MercadoPago"))
    }
}

/// Identity fake; `None` makes every lookup fail.
#[derive(Default)]
pub struct FakeIdentity {
    pub record: Option<IdentityRecord>,
}

#[async_trait]
impl IdentityLookup for FakeIdentity {
    async fn lookup(
        &self,
        _document_type: DocumentType,
        _document_number: &str,
    ) -> Result<IdentityRecord, IntegrationError> {
        self.record
            .clone()
            .ok_or(IntegrationError::NotConfigured("Identity lookup"))
    }
}

pub fn test_config(operator_token: Option<&str>) -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://localhost/unused".into(),
            max_connections: 1,
            min_connections: 1,
        },
        auth: AuthConfig {
            operator_token: operator_token.map(str::to_string),
        },
        lending: LendingConfig::default(),
        cash: CashConfig::default(),
        gateways: GatewayConfig::default(),
        identity: IdentityConfig::default(),
    }
}

/// State with a disconnected database and the given fakes.
pub fn test_state(
    operator_token: Option<&str>,
    flow: FakeFlow,
    mercadopago: FakeMercadoPago,
    identity: FakeIdentity,
) -> AppState {
    AppState {
        db: Arc::new(DatabaseConnection::default()),
        config: Arc::new(test_config(operator_token)),
        flow: Arc::new(flow),
        mercadopago: Arc::new(mercadopago),
        identity: Arc::new(identity),
    }
}

pub fn default_state() -> AppState {
    test_state(
        None,
        FakeFlow::default(),
        FakeMercadoPago::default(),
        FakeIdentity::default(),
    )
}

pub async fn send(state: AppState, request: Request<Body>) -> Response {
    let app: Router = create_router(state);
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn body_json(response: Response) -> serde_json::Value {
    use http_body_util::BodyExt;

    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

//! Gateway webhooks.
//!
//! Gateways retry on anything but HTTP 200, so both handlers always answer
//! `200 OK`. What actually happened is reported as a [`WebhookOutcome`] and
//! logged.

use std::fmt;

use axum::{
    Form, Json, Router,
    extract::{
        State,
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::NaiveDate;
use lendshop_core::cash::PaymentMethod;
use lendshop_db::repositories::{PaymentError, PaymentRepository, RecordPaymentInput};
use lendshop_shared::types::round2;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::AppState;

/// Creates the public webhook routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flow/webhook", post(flow_webhook))
        .route("/mercadopago/webhook", post(mercadopago_webhook))
}

/// Result of processing one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A new payment was recorded.
    Applied {
        /// Recorded payment.
        payment_id: Uuid,
        /// Installment it was applied to.
        installment_id: Uuid,
    },
    /// The gateway payment was already recorded.
    Duplicate,
    /// The gateway reports the payment as not (yet) approved.
    NotApproved(String),
    /// The payment references no known installment.
    UnknownInstallment(String),
    /// The notification carries nothing to process.
    Ignored(&'static str),
    /// Processing failed.
    Failed(String),
}

impl fmt::Display for WebhookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied { .. } => f.write_str("applied"),
            Self::Duplicate => f.write_str("duplicate"),
            Self::NotApproved(_) => f.write_str("not_approved"),
            Self::UnknownInstallment(_) => f.write_str("unknown_installment"),
            Self::Ignored(_) => f.write_str("ignored"),
            Self::Failed(_) => f.write_str("failed"),
        }
    }
}

impl WebhookOutcome {
    fn log(&self, gateway: &'static str, reference: &str) {
        match self {
            Self::Applied {
                payment_id,
                installment_id,
            } => info!(
                gateway,
                reference,
                payment_id = %payment_id,
                installment_id = %installment_id,
                outcome = %self,
                "Webhook payment applied"
            ),
            Self::Duplicate => info!(gateway, reference, outcome = %self, "Webhook already processed"),
            Self::NotApproved(status) => {
                info!(gateway, reference, status = %status, outcome = %self, "Webhook payment not approved");
            }
            Self::UnknownInstallment(value) => {
                warn!(gateway, reference, installment = %value, outcome = %self, "Webhook references an unknown installment");
            }
            Self::Ignored(reason) => debug!(gateway, reference, reason, outcome = %self, "Webhook ignored"),
            Self::Failed(e) => error!(gateway, reference, error = %e, outcome = %self, "Webhook processing failed"),
        }
    }
}

/// An approved gateway payment to record.
#[derive(Debug, Clone)]
pub struct GatewayPayment {
    /// Installment id as sent back by the gateway.
    pub installment_reference: String,
    /// Amount paid.
    pub amount: Decimal,
    /// Gateway method.
    pub method: PaymentMethod,
    /// Gateway payment reference, unique per method.
    pub external_reference: String,
    /// Payer email reported by the gateway.
    pub payer_email: Option<String>,
}

impl GatewayPayment {
    /// Payment input for the installment.
    ///
    /// The charge is both the amount offered and the amount received, so
    /// whatever exceeds the amount owed is stored as an overpayment.
    fn into_input(self, installment_id: Uuid, today: NaiveDate) -> RecordPaymentInput {
        // Gateways report JSON numbers; anything below the cent is float noise
        let charged = round2(self.amount);
        RecordPaymentInput {
            installment_id,
            amount: charged,
            amount_received: Some(charged),
            method: self.method,
            external_reference: Some(self.external_reference),
            payer_email: self.payer_email.filter(|e| !e.trim().is_empty()),
            today,
        }
    }
}

/// Records an approved gateway payment through the same path as counter payments.
pub async fn apply_gateway_payment(state: &AppState, payment: GatewayPayment) -> WebhookOutcome {
    let Ok(installment_id) = Uuid::parse_str(payment.installment_reference.trim()) else {
        return WebhookOutcome::UnknownInstallment(payment.installment_reference);
    };

    let repo = PaymentRepository::new((*state.db).clone(), state.default_late_fee_rate());
    let input = payment.into_input(installment_id, state.today());

    match repo.record_payment(input).await {
        Ok(recorded) => WebhookOutcome::Applied {
            payment_id: recorded.payment.id,
            installment_id,
        },
        Err(PaymentError::Duplicate { .. }) => WebhookOutcome::Duplicate,
        Err(PaymentError::InstallmentNotFound(id)) => {
            WebhookOutcome::UnknownInstallment(id.to_string())
        }
        Err(e) => WebhookOutcome::Failed(e.to_string()),
    }
}

/// Flow confirmation body.
#[derive(Debug, Deserialize)]
pub struct FlowWebhook {
    /// Checkout token to query.
    pub token: Option<String>,
}

/// MercadoPago notification body.
#[derive(Debug, Deserialize)]
pub struct MercadoPagoWebhook {
    /// Notification topic, e.g. "payment".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Notification data.
    pub data: Option<MercadoPagoWebhookData>,
}

/// Data of a MercadoPago notification.
#[derive(Debug, Deserialize)]
pub struct MercadoPagoWebhookData {
    /// Resource id; MercadoPago sends it as a string or a number.
    pub id: serde_json::Value,
}

impl MercadoPagoWebhookData {
    fn id(&self) -> Option<String> {
        match &self.id {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// POST `/flow/webhook` - Flow payment confirmation.
async fn flow_webhook(
    State(state): State<AppState>,
    form: Result<Form<FlowWebhook>, FormRejection>,
) -> impl IntoResponse {
    let token = match form {
        Ok(Form(FlowWebhook { token: Some(token) })) if !token.is_empty() => token,
        Ok(_) => {
            WebhookOutcome::Ignored("missing token").log("flow", "");
            return (StatusCode::OK, "OK");
        }
        Err(e) => {
            WebhookOutcome::Ignored("unreadable body").log("flow", &e.body_text());
            return (StatusCode::OK, "OK");
        }
    };

    let outcome = process_flow(&state, &token).await;
    outcome.log("flow", &token);
    (StatusCode::OK, "OK")
}

async fn process_flow(state: &AppState, token: &str) -> WebhookOutcome {
    let status = match state.flow.payment_status(token).await {
        Ok(status) => status,
        Err(e) => return WebhookOutcome::Failed(e.to_string()),
    };
    if !status.is_approved() {
        return WebhookOutcome::NotApproved(status.status.to_string());
    }

    apply_gateway_payment(
        state,
        GatewayPayment {
            installment_reference: status.commerce_order,
            amount: status.amount,
            method: PaymentMethod::Flow,
            external_reference: status.flow_order.to_string(),
            payer_email: status.payer,
        },
    )
    .await
}

/// POST `/mercadopago/webhook` - MercadoPago notification.
async fn mercadopago_webhook(
    State(state): State<AppState>,
    body: Result<Json<MercadoPagoWebhook>, JsonRejection>,
) -> impl IntoResponse {
    let notification = match body {
        Ok(Json(notification)) => notification,
        Err(e) => {
            WebhookOutcome::Ignored("unreadable body").log("mercadopago", &e.body_text());
            return (StatusCode::OK, "OK");
        }
    };

    if notification.kind.as_deref() != Some("payment") {
        WebhookOutcome::Ignored("not a payment notification").log("mercadopago", "");
        return (StatusCode::OK, "OK");
    }
    let Some(payment_id) = notification.data.as_ref().and_then(MercadoPagoWebhookData::id) else {
        WebhookOutcome::Ignored("missing payment id").log("mercadopago", "");
        return (StatusCode::OK, "OK");
    };

    let outcome = process_mercadopago(&state, &payment_id).await;
    outcome.log("mercadopago", &payment_id);
    (StatusCode::OK, "OK")
}

async fn process_mercadopago(state: &AppState, payment_id: &str) -> WebhookOutcome {
    let payment = match state.mercadopago.get_payment(payment_id).await {
        Ok(payment) => payment,
        Err(e) => return WebhookOutcome::Failed(e.to_string()),
    };
    if !payment.is_approved() {
        return WebhookOutcome::NotApproved(payment.status);
    }
    let Some(reference) = payment.external_reference.clone() else {
        return WebhookOutcome::UnknownInstallment(String::new());
    };

    apply_gateway_payment(
        state,
        GatewayPayment {
            installment_reference: reference,
            amount: payment.transaction_amount,
            method: PaymentMethod::MercadoPago,
            external_reference: payment.id.to_string(),
            payer_email: payment.payer_email().map(str::to_string),
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(WebhookOutcome::Duplicate.to_string(), "duplicate");
        assert_eq!(
            WebhookOutcome::NotApproved("pending".into()).to_string(),
            "not_approved"
        );
        assert_eq!(WebhookOutcome::Ignored("x").to_string(), "ignored");
    }

    #[test]
    fn test_gateway_charge_is_recorded_as_received() {
        let payment = GatewayPayment {
            installment_reference: String::new(),
            amount: Decimal::new(101, 0),
            method: PaymentMethod::Flow,
            external_reference: "88001".into(),
            payer_email: Some("  ".into()),
        };
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let input = payment.into_input(Uuid::nil(), today);

        assert_eq!(input.amount, Decimal::new(101, 0));
        assert_eq!(input.amount_received, Some(Decimal::new(101, 0)));
        assert_eq!(input.external_reference.as_deref(), Some("88001"));
        assert!(input.payer_email.is_none());
    }

    #[test]
    fn test_gateway_float_noise_is_rounded_to_cents() {
        let payment = GatewayPayment {
            installment_reference: String::new(),
            amount: Decimal::new(1_004_000_001, 7),
            method: PaymentMethod::MercadoPago,
            external_reference: "123".into(),
            payer_email: None,
        };
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let input = payment.into_input(Uuid::nil(), today);

        assert_eq!(input.amount, Decimal::new(10_040, 2));
        assert_eq!(input.amount_received, Some(input.amount));
    }

    #[test]
    fn test_mercadopago_id_string_or_number() {
        let data: MercadoPagoWebhookData = serde_json::from_str(r#"{"id":"123"}"#).unwrap();
        assert_eq!(data.id().as_deref(), Some("123"));

        let data: MercadoPagoWebhookData = serde_json::from_str(r#"{"id":456}"#).unwrap();
        assert_eq!(data.id().as_deref(), Some("456"));

        let data: MercadoPagoWebhookData = serde_json::from_str(r#"{"id":""}"#).unwrap();
        assert!(data.id().is_none());
    }

    mod router {
        use std::sync::Arc;

        use axum::{
            body::Body,
            http::{Request, StatusCode},
            response::Response,
        };
        use http_body_util::BodyExt;
        use lendshop_integrations::{FlowGateway, FlowPaymentStatus, MercadoPagoPayment};
        use rust_decimal_macros::dec;

        use super::super::{process_flow, process_mercadopago};
        use super::WebhookOutcome;
        use crate::test_support::{
            FakeFlow, FakeIdentity, FakeMercadoPago, default_state, send, test_state,
        };

        async fn text(response: Response) -> String {
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            String::from_utf8(bytes.to_vec()).unwrap()
        }

        fn flow_status(status: i32, commerce_order: &str) -> FlowPaymentStatus {
            FlowPaymentStatus {
                flow_order: 88_001,
                commerce_order: commerce_order.into(),
                status,
                amount: dec!(101),
                currency: "PEN".into(),
                payer: Some("ana@mail.pe".into()),
            }
        }

        fn flow_form(token: &str) -> Request<Body> {
            Request::post("/api/v1/flow/webhook")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(format!("token={token}")))
                .unwrap()
        }

        fn mercadopago_json(body: &'static str) -> Request<Body> {
            Request::post("/api/v1/mercadopago/webhook")
                .header("Content-Type", "application/json")
                .body(Body::from(body))
                .unwrap()
        }

        #[tokio::test]
        async fn test_flow_webhook_without_token_is_ok() {
            let response = send(default_state(), flow_form("")).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(text(response).await, "OK");
        }

        #[tokio::test]
        async fn test_flow_webhook_with_wrong_content_type_is_ok() {
            let response = send(
                default_state(),
                Request::post("/api/v1/flow/webhook")
                    .header("Content-Type", "text/plain")
                    .body(Body::from("garbage"))
                    .unwrap(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn test_flow_webhook_queries_the_token() {
            let flow = Arc::new(FakeFlow {
                status: Some(flow_status(1, "ignored")),
                ..FakeFlow::default()
            });
            let gateway: Arc<dyn FlowGateway> = flow.clone();
            let mut state = default_state();
            state.flow = gateway;

            let response = send(state, flow_form("tok-123")).await;

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(*flow.status_calls.lock().unwrap(), vec!["tok-123".to_string()]);
        }

        #[tokio::test]
        async fn test_flow_gateway_failure_is_reported_as_failed() {
            let outcome = process_flow(&default_state(), "tok").await;
            assert!(matches!(outcome, WebhookOutcome::Failed(_)));
        }

        #[tokio::test]
        async fn test_flow_pending_payment_is_not_applied() {
            let flow = FakeFlow {
                status: Some(flow_status(1, "6f1c2a9e-3b7d-4e21-9a43-2c5d8e7f0a11")),
                ..FakeFlow::default()
            };
            let state = test_state(None, flow, FakeMercadoPago::default(), FakeIdentity::default());

            let outcome = process_flow(&state, "tok").await;
            assert_eq!(outcome, WebhookOutcome::NotApproved("1".into()));
        }

        #[tokio::test]
        async fn test_flow_approved_payment_with_bad_reference_is_unknown() {
            let flow = FakeFlow {
                status: Some(flow_status(2, "cuota-17")),
                ..FakeFlow::default()
            };
            let state = test_state(None, flow, FakeMercadoPago::default(), FakeIdentity::default());

            let outcome = process_flow(&state, "tok").await;
            assert_eq!(outcome, WebhookOutcome::UnknownInstallment("cuota-17".into()));
        }

        #[tokio::test]
        async fn test_mercadopago_non_payment_topic_is_ok() {
            let response = send(
                default_state(),
                mercadopago_json(r#"{"type":"merchant_order","data":{"id":"1"}}"#),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(text(response).await, "OK");
        }

        #[tokio::test]
        async fn test_mercadopago_malformed_body_is_ok() {
            let response = send(default_state(), mercadopago_json("{not json")).await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn test_mercadopago_gateway_failure_is_ok() {
            let response = send(
                default_state(),
                mercadopago_json(r#"{"type":"payment","data":{"id":"123"}}"#),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn test_mercadopago_outcomes() {
            let payment = |status: &str, reference: Option<&str>| MercadoPagoPayment {
                id: 555,
                status: status.into(),
                external_reference: reference.map(str::to_string),
                transaction_amount: dec!(101),
                payer: None,
            };

            let state = test_state(
                None,
                FakeFlow::default(),
                FakeMercadoPago {
                    payment: Some(payment("in_process", Some("x"))),
                },
                FakeIdentity::default(),
            );
            assert_eq!(
                process_mercadopago(&state, "555").await,
                WebhookOutcome::NotApproved("in_process".into())
            );

            let state = test_state(
                None,
                FakeFlow::default(),
                FakeMercadoPago {
                    payment: Some(payment("approved", None)),
                },
                FakeIdentity::default(),
            );
            assert_eq!(
                process_mercadopago(&state, "555").await,
                WebhookOutcome::UnknownInstallment(String::new())
            );
        }
    }
}


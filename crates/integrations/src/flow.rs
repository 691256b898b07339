//! Flow checkout client.
//!
//! Every request is form-encoded and signed: parameters are sorted by key,
//! joined as `k=v&k=v`, signed with HMAC-SHA256 using the secret key, and the
//! hex digest is sent as parameter `s`.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use lendshop_shared::FlowConfig;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;

use crate::error::IntegrationError;

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "Flow";

/// Flow status code for a paid order.
pub const FLOW_STATUS_APPROVED: i32 = 2;

/// Smallest amount Flow accepts, in whole soles.
const MIN_FLOW_AMOUNT: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Flow payment method code meaning "let the payer choose".
const ALL_PAYMENT_METHODS: &str = "9";

/// Signs Flow request parameters.
#[derive(Clone)]
pub struct FlowSigner {
    secret: String,
}

impl FlowSigner {
    /// Creates a signer for the given secret key.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Joins parameters as `k=v&k=v` in key order.
    #[must_use]
    pub fn canonical(params: &BTreeMap<&str, String>) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Hex-encoded HMAC-SHA256 of the canonical parameter string.
    #[must_use]
    pub fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        self.sign_str(&Self::canonical(params))
    }

    fn sign_str(&self, payload: &str) -> String {
        // HMAC accepts keys of any length
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC key of any size is valid"));
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Amount sent to Flow: rounded to whole units, at least 2.
#[must_use]
pub fn flow_amount(amount: Decimal) -> Decimal {
    lendshop_shared::types::money::round0(amount).max(MIN_FLOW_AMOUNT)
}

/// Order to create on Flow.
#[derive(Debug, Clone)]
pub struct FlowOrderRequest {
    /// Our reference; the installment id.
    pub commerce_order: String,
    /// Text shown to the payer.
    pub subject: String,
    /// Amount to charge before Flow rounding.
    pub amount: Decimal,
    /// Payer email.
    pub email: String,
    /// Webhook URL.
    pub url_confirmation: String,
    /// Browser return URL.
    pub url_return: String,
}

/// An order created on Flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowOrder {
    /// Checkout page URL.
    pub url: String,
    /// Checkout token.
    pub token: String,
    /// Flow's order number.
    pub flow_order: i64,
}

impl FlowOrder {
    /// URL the payer is redirected to.
    #[must_use]
    pub fn redirect_url(&self) -> String {
        format!("{}?token={}", self.url, self.token)
    }
}

/// Payment status reported by Flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPaymentStatus {
    /// Flow's order number.
    pub flow_order: i64,
    /// Our reference; the installment id.
    pub commerce_order: String,
    /// 1 pending, 2 paid, 3 rejected, 4 cancelled.
    pub status: i32,
    /// Amount paid.
    pub amount: Decimal,
    /// Currency code.
    #[serde(default)]
    pub currency: String,
    /// Payer email.
    #[serde(default)]
    pub payer: Option<String>,
}

impl FlowPaymentStatus {
    /// Whether the order was paid.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        self.status == FLOW_STATUS_APPROVED
    }
}

/// Flow operations used by the API.
#[async_trait]
pub trait FlowGateway: Send + Sync {
    /// Creates a checkout order.
    async fn create_order(&self, request: &FlowOrderRequest) -> Result<FlowOrder, IntegrationError>;

    /// Fetches the status of the payment behind a checkout token.
    async fn payment_status(&self, token: &str) -> Result<FlowPaymentStatus, IntegrationError>;
}

/// HTTP client for the Flow REST API.
pub struct FlowClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    currency: String,
    signer: FlowSigner,
}

impl FlowClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &FlowConfig, timeout: Duration) -> Result<Self, IntegrationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(IntegrationError::http(SERVICE))?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            api_key: config.api_key.clone(),
            currency: config.currency.clone(),
            signer: FlowSigner::new(config.secret_key.clone()),
        })
    }

    fn ensure_configured(&self) -> Result<(), IntegrationError> {
        if self.api_key.is_empty() {
            return Err(IntegrationError::NotConfigured(SERVICE));
        }
        Ok(())
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        mut params: BTreeMap<&str, String>,
    ) -> Result<T, IntegrationError> {
        let signature = self.signer.sign(&params);
        params.insert("s", signature);

        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .form(&params)
            .send()
            .await
            .map_err(IntegrationError::http(SERVICE))?;

        if !response.status().is_success() {
            return Err(IntegrationError::from_response(SERVICE, response).await);
        }

        response.json().await.map_err(IntegrationError::http(SERVICE))
    }
}

#[async_trait]
impl FlowGateway for FlowClient {
    async fn create_order(&self, request: &FlowOrderRequest) -> Result<FlowOrder, IntegrationError> {
        self.ensure_configured()?;

        let amount = flow_amount(request.amount);
        let params = BTreeMap::from([
            ("apiKey", self.api_key.clone()),
            ("commerceOrder", request.commerce_order.clone()),
            ("subject", request.subject.clone()),
            ("currency", self.currency.clone()),
            ("amount", amount.to_string()),
            ("email", request.email.clone()),
            ("urlConfirmation", request.url_confirmation.clone()),
            ("urlReturn", request.url_return.clone()),
            ("paymentMethod", ALL_PAYMENT_METHODS.to_string()),
        ]);

        tracing::debug!(commerce_order = %request.commerce_order, %amount, "Creating Flow order");
        let order: FlowOrder = self.post("/payment/create", params).await?;
        tracing::info!(flow_order = order.flow_order, "Flow order created");
        Ok(order)
    }

    async fn payment_status(&self, token: &str) -> Result<FlowPaymentStatus, IntegrationError> {
        self.ensure_configured()?;

        let params = BTreeMap::from([
            ("apiKey", self.api_key.clone()),
            ("token", token.to_string()),
        ]);
        self.post("/payment/getStatus", params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_hmac_known_vector() {
        let signer = FlowSigner::new("key");
        assert_eq!(
            signer.sign_str("The quick brown fox jumps over the lazy dog"),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_canonical_sorts_keys() {
        let params = BTreeMap::from([
            ("token", "abc".to_string()),
            ("apiKey", "KEY".to_string()),
            ("amount", "150".to_string()),
        ]);
        assert_eq!(
            FlowSigner::canonical(&params),
            "amount=150&apiKey=KEY&token=abc"
        );
    }

    #[test]
    fn test_signature_independent_of_insertion_order() {
        let signer = FlowSigner::new("secret");
        let mut a = BTreeMap::new();
        a.insert("apiKey", "KEY".to_string());
        a.insert("token", "tok".to_string());
        let mut b = BTreeMap::new();
        b.insert("token", "tok".to_string());
        b.insert("apiKey", "KEY".to_string());
        assert_eq!(signer.sign(&a), signer.sign(&b));
        assert_eq!(signer.sign(&a).len(), 64);
    }

    #[test]
    fn test_flow_amount_rounding_and_minimum() {
        assert_eq!(flow_amount(dec!(150.49)), dec!(150));
        assert_eq!(flow_amount(dec!(150.50)), dec!(151));
        assert_eq!(flow_amount(dec!(1.20)), dec!(2));
    }

    #[test]
    fn test_status_deserializes_numeric_amount() {
        let status: FlowPaymentStatus = serde_json::from_str(
            r#"{"flowOrder":3567899,"commerceOrder":"abc","status":2,"amount":151,"currency":"PEN","payer":"ana@mail.pe"}"#,
        )
        .unwrap();
        assert!(status.is_approved());
        assert_eq!(status.amount, dec!(151));
        assert_eq!(status.payer.as_deref(), Some("ana@mail.pe"));
    }

    #[test]
    fn test_redirect_url() {
        let order = FlowOrder {
            url: "https://sandbox.flow.cl/app/web/pay.php".into(),
            token: "TOK".into(),
            flow_order: 1,
        };
        assert_eq!(
            order.redirect_url(),
            "https://sandbox.flow.cl/app/web/pay.php?token=TOK"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_client_refuses() {
        let client = FlowClient::new(&FlowConfig::default(), Duration::from_secs(1)).unwrap();
        let result = client.payment_status("tok").await;
        assert!(matches!(result, Err(IntegrationError::NotConfigured(_))));
    }
}

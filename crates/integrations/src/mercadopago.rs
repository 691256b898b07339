//! MercadoPago checkout client.

use std::time::Duration;

use async_trait::async_trait;
use lendshop_shared::MercadoPagoConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::IntegrationError;

const SERVICE: &str = "MercadoPago";

/// Status MercadoPago reports for a captured payment.
pub const STATUS_APPROVED: &str = "approved";

/// Checkout preference to create.
#[derive(Debug, Clone)]
pub struct PreferenceRequest {
    /// Our reference; the installment id.
    pub external_reference: String,
    /// Item title shown at checkout.
    pub title: String,
    /// Amount to charge.
    pub amount: Decimal,
    /// Payer email, if known.
    pub payer_email: Option<String>,
    /// Base URL for the browser return pages.
    pub return_base_url: String,
    /// Webhook URL.
    pub notification_url: String,
}

/// A checkout preference created on MercadoPago.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preference {
    /// Preference id.
    pub id: String,
    /// Production checkout URL.
    pub init_point: String,
    /// Sandbox checkout URL.
    #[serde(default)]
    pub sandbox_init_point: String,
}

/// Payer details on a payment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Payer {
    /// Payer email.
    #[serde(default)]
    pub email: Option<String>,
}

/// A payment as reported by MercadoPago.
#[derive(Debug, Clone, Deserialize)]
pub struct MercadoPagoPayment {
    /// Payment id.
    pub id: i64,
    /// Payment status, e.g. "approved".
    pub status: String,
    /// Our reference; the installment id.
    #[serde(default)]
    pub external_reference: Option<String>,
    /// Amount paid.
    pub transaction_amount: Decimal,
    /// Payer details.
    #[serde(default)]
    pub payer: Option<Payer>,
}

impl MercadoPagoPayment {
    /// Payer email, if MercadoPago reported one.
    #[must_use]
    pub fn payer_email(&self) -> Option<&str> {
        self.payer.as_ref().and_then(|p| p.email.as_deref())
    }

    /// Whether the payment was captured.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == STATUS_APPROVED
    }
}

#[derive(Serialize)]
struct PreferenceItem<'a> {
    id: &'a str,
    title: &'a str,
    quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
    currency_id: &'a str,
}

#[derive(Serialize)]
struct BackUrls {
    success: String,
    failure: String,
    pending: String,
}

#[derive(Serialize)]
struct PreferenceBody<'a> {
    items: Vec<PreferenceItem<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payer: Option<serde_json::Value>,
    back_urls: BackUrls,
    auto_return: &'a str,
    external_reference: &'a str,
    notification_url: &'a str,
    statement_descriptor: &'a str,
}

/// MercadoPago operations used by the API.
#[async_trait]
pub trait MercadoPagoGateway: Send + Sync {
    /// Creates a checkout preference.
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<Preference, IntegrationError>;

    /// Fetches a payment by id.
    async fn get_payment(&self, payment_id: &str) -> Result<MercadoPagoPayment, IntegrationError>;
}

/// HTTP client for the MercadoPago REST API.
pub struct MercadoPagoClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    statement_descriptor: String,
    currency: String,
}

impl MercadoPagoClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &MercadoPagoConfig, timeout: Duration) -> Result<Self, IntegrationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(IntegrationError::http(SERVICE))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            statement_descriptor: config.statement_descriptor.clone(),
            currency: config.currency.clone(),
        })
    }

    fn ensure_configured(&self) -> Result<(), IntegrationError> {
        if self.access_token.is_empty() {
            return Err(IntegrationError::NotConfigured(SERVICE));
        }
        Ok(())
    }

    async fn read<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, IntegrationError> {
        if !response.status().is_success() {
            return Err(IntegrationError::from_response(SERVICE, response).await);
        }
        response.json().await.map_err(IntegrationError::http(SERVICE))
    }
}

#[async_trait]
impl MercadoPagoGateway for MercadoPagoClient {
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<Preference, IntegrationError> {
        self.ensure_configured()?;

        let base = request.return_base_url.trim_end_matches('/');
        let body = PreferenceBody {
            items: vec![PreferenceItem {
                id: &request.external_reference,
                title: &request.title,
                quantity: 1,
                unit_price: request.amount,
                currency_id: &self.currency,
            }],
            payer: request
                .payer_email
                .as_ref()
                .map(|email| serde_json::json!({ "email": email })),
            back_urls: BackUrls {
                success: format!(
                    "{base}?payment=success&installment_id={}",
                    request.external_reference
                ),
                failure: format!("{base}?payment=failure"),
                pending: format!("{base}?payment=pending"),
            },
            auto_return: "approved",
            external_reference: &request.external_reference,
            notification_url: &request.notification_url,
            statement_descriptor: &self.statement_descriptor,
        };

        let response = self
            .http
            .post(format!("{}/checkout/preferences", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(IntegrationError::http(SERVICE))?;

        let preference: Preference = Self::read(response).await?;
        tracing::info!(preference_id = %preference.id, "MercadoPago preference created");
        Ok(preference)
    }

    async fn get_payment(&self, payment_id: &str) -> Result<MercadoPagoPayment, IntegrationError> {
        self.ensure_configured()?;

        if payment_id.is_empty() || !payment_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IntegrationError::InvalidResponse {
                service: SERVICE,
                message: format!("invalid payment id '{payment_id}'"),
            });
        }

        let response = self
            .http
            .get(format!("{}/v1/payments/{payment_id}", self.base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(IntegrationError::http(SERVICE))?;

        Self::read(response).await
    }
}

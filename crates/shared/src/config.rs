//! Application configuration management.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Operator authentication.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Loan origination and late-fee settings.
    #[serde(default)]
    pub lending: LendingConfig,
    /// Cash drawer settings.
    #[serde(default)]
    pub cash: CashConfig,
    /// Payment gateway credentials.
    #[serde(default)]
    pub gateways: GatewayConfig,
    /// Government ID lookup service.
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Operator authentication.
///
/// When `operator_token` is unset the back-office routes are open, which is
/// only meant for local development.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Static bearer token shared by shop operators.
    pub operator_token: Option<String>,
}

/// Loan origination limits and late-fee defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct LendingConfig {
    /// Largest principal a single loan may carry.
    #[serde(default = "default_max_principal")]
    pub max_principal: Decimal,
    /// Largest number of installments a single loan may carry.
    #[serde(default = "default_max_installments")]
    pub max_installments: u32,
    /// Largest flat interest percentage a single loan may carry.
    #[serde(default = "default_max_interest_percent")]
    pub max_interest_percent: Decimal,
    /// Late-fee percentage used until an operator stores one.
    #[serde(default = "default_late_fee_percent")]
    pub default_late_fee_percent: Decimal,
    /// IANA time zone of the shop, used to decide what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_max_principal() -> Decimal {
    Decimal::new(20_000, 0)
}

fn default_max_installments() -> u32 {
    48
}

fn default_max_interest_percent() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn default_late_fee_percent() -> Decimal {
    Decimal::ONE
}

fn default_timezone() -> String {
    "America/Lima".to_string()
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            max_principal: default_max_principal(),
            max_installments: default_max_installments(),
            max_interest_percent: default_max_interest_percent(),
            default_late_fee_percent: default_late_fee_percent(),
            timezone: default_timezone(),
        }
    }
}

impl LendingConfig {
    /// Returns the current calendar date in the shop's time zone.
    ///
    /// Falls back to UTC when the configured zone is not a valid IANA name.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        match self.timezone.parse::<chrono_tz::Tz>() {
            Ok(tz) => Utc::now().with_timezone(&tz).date_naive(),
            Err(_) => {
                tracing::warn!(timezone = %self.timezone, "Unknown shop timezone, using UTC");
                Utc::now().date_naive()
            }
        }
    }
}

/// What happens when the counted drawer cash does not match the expected cash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosePolicy {
    /// Reject the close unless the variance is exactly zero.
    #[default]
    Strict,
    /// Close anyway and report the surplus or shortfall.
    Tolerant,
}

/// Cash drawer settings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CashConfig {
    /// Close policy for the drawer.
    #[serde(default)]
    pub close_policy: ClosePolicy,
}

/// Payment gateway settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Public URL of this service, used for return and webhook URLs.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Timeout applied to every gateway request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Flow credentials.
    #[serde(default)]
    pub flow: FlowConfig,
    /// MercadoPago credentials.
    #[serde(default)]
    pub mercadopago: MercadoPagoConfig,
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_currency() -> String {
    crate::types::CURRENCY.to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_public_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            flow: FlowConfig::default(),
            mercadopago: MercadoPagoConfig::default(),
        }
    }
}

/// Flow credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    /// API key issued by Flow.
    #[serde(default)]
    pub api_key: String,
    /// Secret used to sign requests.
    #[serde(default)]
    pub secret_key: String,
    /// Use the sandbox environment.
    #[serde(default = "default_true")]
    pub sandbox: bool,
    /// Currency code sent with every order.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_true() -> bool {
    true
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            sandbox: true,
            currency: default_currency(),
        }
    }
}

impl FlowConfig {
    /// Returns the API root for the configured environment.
    #[must_use]
    pub fn base_url(&self) -> &'static str {
        if self.sandbox {
            "https://sandbox.flow.cl/api"
        } else {
            "https://www.flow.cl/api"
        }
    }
}

/// MercadoPago credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct MercadoPagoConfig {
    /// Access token for the REST API.
    #[serde(default)]
    pub access_token: String,
    /// API root.
    #[serde(default = "default_mercadopago_base_url")]
    pub base_url: String,
    /// Text shown on the payer's card statement.
    #[serde(default = "default_statement_descriptor")]
    pub statement_descriptor: String,
    /// Currency code sent with every preference.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_mercadopago_base_url() -> String {
    "https://api.mercadopago.com".to_string()
}

fn default_statement_descriptor() -> String {
    "LENDSHOP".to_string()
}

impl Default for MercadoPagoConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            base_url: default_mercadopago_base_url(),
            statement_descriptor: default_statement_descriptor(),
            currency: default_currency(),
        }
    }
}

/// Government ID (DNI/RUC) lookup service.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// API root.
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,
    /// Bearer token for the lookup API.
    #[serde(default)]
    pub api_token: String,
    /// How long a lookup result stays cached.
    #[serde(default = "default_identity_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_identity_base_url() -> String {
    "https://api.apis.net.pe/v1".to_string()
}

fn default_identity_cache_ttl_secs() -> u64 {
    60
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: default_identity_base_url(),
            api_token: String::new(),
            cache_ttl_secs: default_identity_cache_ttl_secs(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LENDSHOP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("LENDSHOP__DATABASE__URL", Some("postgres://localhost/lendshop")),
                ("LENDSHOP__SERVER__PORT", Some("9090")),
                ("LENDSHOP__CASH__CLOSE_POLICY", Some("tolerant")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/lendshop");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.cash.close_policy, ClosePolicy::Tolerant);
            },
        );
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        temp_env::with_vars(
            [("LENDSHOP__DATABASE__URL", Some("postgres://localhost/lendshop"))],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.lending.max_installments, 48);
                assert_eq!(config.lending.max_principal, dec!(20000));
                assert_eq!(config.lending.max_interest_percent, dec!(100));
                assert_eq!(config.lending.default_late_fee_percent, dec!(1));
                assert_eq!(config.cash.close_policy, ClosePolicy::Strict);
                assert!(config.auth.operator_token.is_none());
                assert!(config.gateways.flow.sandbox);
                assert_eq!(config.identity.cache_ttl_secs, 60);
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars_unset(["LENDSHOP__DATABASE__URL"], || {
            assert!(AppConfig::load().is_err());
        });
    }

    #[test]
    fn test_flow_base_url() {
        let mut flow = FlowConfig::default();
        assert_eq!(flow.base_url(), "https://sandbox.flow.cl/api");
        flow.sandbox = false;
        assert_eq!(flow.base_url(), "https://www.flow.cl/api");
    }

    #[test]
    fn test_unknown_timezone_falls_back() {
        let lending = LendingConfig {
            timezone: "Mars/Olympus".to_string(),
            ..LendingConfig::default()
        };
        let today = lending.today();
        let utc_today = Utc::now().date_naive();
        assert!((today - utc_today).num_days().abs() <= 1);
    }
}

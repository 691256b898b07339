//! DNI/RUC lookup against apis.net.pe.
//!
//! Results are cached in memory to stay under the provider's rate limit.

use std::time::Duration;

use async_trait::async_trait;
use lendshop_core::client::{ClientService, DocumentType};
use lendshop_shared::IdentityConfig;
use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::error::IntegrationError;

const SERVICE: &str = "Identity lookup";

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Identity data resolved for a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Person or business name.
    pub name: String,
    /// Registered address, may be empty.
    pub address: String,
    /// Taxpayer status for RUC, empty for DNI.
    pub status: String,
}

/// Resolves documents to names.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Looks up a document.
    async fn lookup(
        &self,
        document_type: DocumentType,
        document_number: &str,
    ) -> Result<IdentityRecord, IntegrationError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DniResponse {
    #[serde(default)]
    nombre: Option<String>,
    #[serde(default)]
    nombres: Option<String>,
    #[serde(default)]
    apellido_paterno: Option<String>,
    #[serde(default)]
    apellido_materno: Option<String>,
    #[serde(default)]
    direccion: Option<String>,
}

impl DniResponse {
    fn into_record(self) -> IdentityRecord {
        let name = self.nombre.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| {
            [self.nombres, self.apellido_paterno, self.apellido_materno]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ")
        });
        IdentityRecord {
            name: ClientService::normalize_name(&name),
            address: self.direccion.unwrap_or_default().trim().to_string(),
            status: String::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RucResponse {
    #[serde(default)]
    nombre: Option<String>,
    #[serde(default)]
    razon_social: Option<String>,
    #[serde(default)]
    direccion: Option<String>,
    #[serde(default)]
    estado: Option<String>,
}

impl RucResponse {
    fn into_record(self) -> IdentityRecord {
        let name = self
            .nombre
            .filter(|n| !n.trim().is_empty())
            .or(self.razon_social)
            .unwrap_or_default();
        IdentityRecord {
            name: ClientService::normalize_name(&name),
            address: self.direccion.unwrap_or_default().trim().to_string(),
            status: self.estado.unwrap_or_default(),
        }
    }
}

/// HTTP client for the DNI/RUC lookup API.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    cache: Cache<String, IdentityRecord>,
}

impl IdentityClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &IdentityConfig) -> Result<Self, IntegrationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(IntegrationError::http(SERVICE))?;

        let cache = Cache::builder()
            .max_capacity(DEFAULT_CACHE_CAPACITY)
            .time_to_live(Duration::from_secs(config.cache_ttl_secs))
            .build();

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            cache,
        })
    }

    fn cache_key(document_type: DocumentType, document_number: &str) -> String {
        format!("{}_{document_number}", document_type.as_str())
    }

    async fn fetch(
        &self,
        document_type: DocumentType,
        document_number: &str,
    ) -> Result<IdentityRecord, IntegrationError> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, document_type.as_str()))
            .query(&[("numero", document_number)])
            .bearer_auth(&self.api_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(IntegrationError::http(SERVICE))?;

        if !response.status().is_success() {
            return Err(IntegrationError::from_response(SERVICE, response).await);
        }

        let record = match document_type {
            DocumentType::Dni => response
                .json::<DniResponse>()
                .await
                .map_err(IntegrationError::http(SERVICE))?
                .into_record(),
            DocumentType::Ruc => response
                .json::<RucResponse>()
                .await
                .map_err(IntegrationError::http(SERVICE))?
                .into_record(),
        };

        if record.name.is_empty() {
            return Err(IntegrationError::InvalidResponse {
                service: SERVICE,
                message: "no name in response".to_string(),
            });
        }
        Ok(record)
    }
}

#[async_trait]
impl IdentityLookup for IdentityClient {
    async fn lookup(
        &self,
        document_type: DocumentType,
        document_number: &str,
    ) -> Result<IdentityRecord, IntegrationError> {
        if self.api_token.is_empty() {
            return Err(IntegrationError::NotConfigured(SERVICE));
        }

        let key = Self::cache_key(document_type, document_number);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(document = %document_number, "Identity lookup served from cache");
            return Ok(cached);
        }

        tracing::debug!(kind = document_type.label(), document = %document_number, "Looking up identity");
        let record = self.fetch(document_type, document_number).await?;
        self.cache.insert(key, record.clone()).await;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dni_name_from_parts() {
        let response: DniResponse = serde_json::from_str(
            r#"{"nombres":"ana maria","apellidoPaterno":"quispe","apellidoMaterno":"rojas"}"#,
        )
        .unwrap();
        let record = response.into_record();
        assert_eq!(record.name, "ANA MARIA QUISPE ROJAS");
        assert_eq!(record.address, "");
    }

    #[test]
    fn test_dni_prefers_full_name() {
        let response: DniResponse =
            serde_json::from_str(r#"{"nombre":"QUISPE ROJAS ANA","nombres":"ana"}"#).unwrap();
        assert_eq!(response.into_record().name, "QUISPE ROJAS ANA");
    }

    #[test]
    fn test_ruc_record() {
        let response: RucResponse = serde_json::from_str(
            r#"{"razonSocial":"bodega sac","direccion":" Jr. Puno 1 ","estado":"ACTIVO"}"#,
        )
        .unwrap();
        let record = response.into_record();
        assert_eq!(record.name, "BODEGA SAC");
        assert_eq!(record.address, "Jr. Puno 1");
        assert_eq!(record.status, "ACTIVO");
    }

    #[tokio::test]
    async fn test_cached_record_is_returned() {
        let config = IdentityConfig {
            api_token: "token".into(),
            base_url: "http://127.0.0.1:9".into(),
            ..IdentityConfig::default()
        };
        let client = IdentityClient::new(&config).unwrap();
        let record = IdentityRecord {
            name: "ANA".into(),
            ..IdentityRecord::default()
        };
        client
            .cache
            .insert(IdentityClient::cache_key(DocumentType::Dni, "12345678"), record.clone())
            .await;

        let found = client.lookup(DocumentType::Dni, "12345678").await.unwrap();
        assert_eq!(found, record);
    }

    #[tokio::test]
    async fn test_missing_token_is_not_configured() {
        let client = IdentityClient::new(&IdentityConfig::default()).unwrap();
        let result = client.lookup(DocumentType::Ruc, "20123456789").await;
        assert!(matches!(result, Err(IntegrationError::NotConfigured(_))));
    }
}

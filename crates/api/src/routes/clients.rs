//! Client registration and lookup routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use lendshop_core::client::{ClientDraft, ClientService, DocumentType};
use lendshop_db::repositories::{ClientRepository, LoanRepository};
use lendshop_integrations::IdentityRecord;
use lendshop_shared::types::PageRequest;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Creates the client routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/from-lookup", post(create_client_from_lookup))
        .route(
            "/clients/lookup/{document_type}/{document_number}",
            get(lookup_document),
        )
        .route("/clients/{id}", get(get_client))
        .route("/clients/{id}/loans", get(list_client_loans))
        .route("/clients/{id}/loans/active", get(get_active_loan))
}

/// Request body for manual registration.
#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    /// "dni" or "ruc".
    pub document_type: DocumentType,
    /// 8 digits for DNI, 11 for RUC.
    pub document_number: String,
    /// Full or business name.
    pub full_name: String,
    /// Street address.
    pub address: String,
    /// Contact phone.
    pub phone: String,
    /// Contact email.
    pub email: Option<String>,
}

/// Request body for registration with the name resolved by the ID lookup.
#[derive(Debug, Deserialize)]
pub struct CreateFromLookupRequest {
    /// "dni" or "ruc".
    pub document_type: DocumentType,
    /// 8 digits for DNI, 11 for RUC.
    pub document_number: String,
    /// Street address; the looked-up address is used when omitted.
    pub address: Option<String>,
    /// Contact phone.
    pub phone: String,
    /// Contact email.
    pub email: Option<String>,
}

/// Result of an ID lookup; fields are empty when the lookup failed.
#[derive(Debug, Serialize)]
pub struct LookupResponse {
    /// "dni" or "ruc".
    pub document_type: DocumentType,
    /// Document looked up.
    pub document_number: String,
    /// Person or business name.
    pub name: String,
    /// Registered address.
    pub address: String,
    /// Taxpayer status (RUC only).
    pub status: String,
    /// Whether the lookup service answered.
    pub found: bool,
}

/// GET `/clients` - List clients.
async fn list_clients(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = ClientRepository::new((*state.db).clone());
    let clients = repo.list(page).await?;
    Ok(Json(clients))
}

/// POST `/clients` - Register a client manually.
async fn create_client(
    State(state): State<AppState>,
    Json(payload): Json<CreateClientRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = ClientRepository::new((*state.db).clone());
    let client = repo
        .create(ClientDraft {
            document_type: payload.document_type,
            document_number: payload.document_number,
            full_name: payload.full_name,
            address: payload.address,
            phone: payload.phone,
            email: payload.email,
        })
        .await?;

    info!(client_id = %client.id, document = %client.document_number, "Client registered");
    Ok((StatusCode::CREATED, Json(client)))
}

/// POST `/clients/from-lookup` - Register a client, resolving the name by ID lookup.
///
/// A failed lookup degrades to a placeholder name.
async fn create_client_from_lookup(
    State(state): State<AppState>,
    Json(payload): Json<CreateFromLookupRequest>,
) -> ApiResult<impl IntoResponse> {
    let document_number = payload.document_number.trim().to_string();
    ClientService::validate_document(payload.document_type, &document_number)?;

    let record = match state
        .identity
        .lookup(payload.document_type, &document_number)
        .await
    {
        Ok(record) if !record.name.trim().is_empty() => Some(record),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, document = %document_number, "Identity lookup failed, using placeholder name");
            None
        }
    };

    let full_name = record.as_ref().map_or_else(
        || ClientService::placeholder_name(payload.document_type, &document_number),
        |r| r.name.clone(),
    );
    let address = payload
        .address
        .filter(|a| !a.trim().is_empty())
        .or_else(|| record.map(|r| r.address))
        .unwrap_or_default();

    let repo = ClientRepository::new((*state.db).clone());
    let client = repo
        .create(ClientDraft {
            document_type: payload.document_type,
            document_number,
            full_name,
            address,
            phone: payload.phone,
            email: payload.email,
        })
        .await?;

    info!(client_id = %client.id, name = %client.full_name, "Client registered from lookup");
    Ok((StatusCode::CREATED, Json(client)))
}

/// GET `/clients/lookup/{document_type}/{document_number}` - Look up a document.
///
/// Always answers 200; a failed lookup returns empty fields.
async fn lookup_document(
    State(state): State<AppState>,
    Path((document_type, document_number)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let document_type: DocumentType = document_type.parse().map_err(ApiError::validation)?;

    let (record, found) = match state.identity.lookup(document_type, &document_number).await {
        Ok(record) => (record, true),
        Err(e) => {
            warn!(error = %e, document = %document_number, "Identity lookup failed");
            (IdentityRecord::default(), false)
        }
    };

    Ok(Json(LookupResponse {
        document_type,
        document_number,
        name: record.name,
        address: record.address,
        status: record.status,
        found,
    }))
}

/// GET `/clients/{id}` - Get a client.
async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = ClientRepository::new((*state.db).clone());
    let client = repo.get(id).await?;
    Ok(Json(client))
}

/// GET `/clients/{id}/loans` - All loans of a client.
async fn list_client_loans(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ClientRepository::new((*state.db).clone()).get(id).await?;
    let loans = LoanRepository::new((*state.db).clone())
        .list_for_client(id)
        .await?;
    Ok(Json(loans))
}

/// GET `/clients/{id}/loans/active` - The active loan with its installments.
async fn get_active_loan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let loan = LoanRepository::new((*state.db).clone())
        .active_for_client(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Client {id} has no active loan")))?;
    Ok(Json(loan))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use lendshop_integrations::IdentityRecord;

    use crate::test_support::{
        FakeFlow, FakeIdentity, FakeMercadoPago, body_json, default_state, send, test_state,
    };

    #[tokio::test]
    async fn test_lookup_failure_returns_empty_fields() {
        let response = send(
            default_state(),
            Request::get("/api/v1/clients/lookup/dni/12345678")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["found"], false);
        assert_eq!(body["name"], "");
        assert_eq!(body["address"], "");
        assert_eq!(body["document_type"], "dni");
    }

    #[tokio::test]
    async fn test_lookup_returns_resolved_name() {
        let identity = FakeIdentity {
            record: Some(IdentityRecord {
                name: "COMERCIAL ANDINA SAC".into(),
                address: "AV. LOS INCAS 123".into(),
                status: "ACTIVO".into(),
            }),
        };
        let state = test_state(None, FakeFlow::default(), FakeMercadoPago::default(), identity);

        let response = send(
            state,
            Request::get("/api/v1/clients/lookup/RUC/20123456789")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["found"], true);
        assert_eq!(body["document_type"], "ruc");
        assert_eq!(body["name"], "COMERCIAL ANDINA SAC");
        assert_eq!(body["status"], "ACTIVO");
    }

    #[tokio::test]
    async fn test_lookup_rejects_unknown_document_type() {
        let response = send(
            default_state(),
            Request::get("/api/v1/clients/lookup/passport/12345678")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_register_from_lookup_validates_document_first() {
        let response = send(
            default_state(),
            Request::post("/api/v1/clients/from-lookup")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"document_type":"dni","document_number":"1234","phone":"999888777"}"#,
                ))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "DNI must be exactly 8 digits");
    }
}

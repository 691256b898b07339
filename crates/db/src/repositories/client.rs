//! Client repository for registration and lookup.

use lendshop_core::client::{ClientDraft, ClientError, ClientService};
use lendshop_shared::AppError;
use lendshop_shared::types::{PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::is_unique_violation;
use crate::entities::clients;

/// Error types for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientRepoError {
    /// Registration data failed validation.
    #[error(transparent)]
    Invalid(#[from] ClientError),

    /// A client with this document number already exists.
    #[error("A client with document {0} already exists")]
    DuplicateDocument(String),

    /// Client not found.
    #[error("Client not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ClientRepoError> for AppError {
    fn from(err: ClientRepoError) -> Self {
        match err {
            ClientRepoError::Invalid(e) => e.into(),
            ClientRepoError::DuplicateDocument(_) => Self::Conflict(err.to_string()),
            ClientRepoError::NotFound(_) => Self::NotFound(err.to_string()),
            ClientRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Client repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    db: DatabaseConnection,
}

impl ClientRepository {
    /// Creates a new client repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a client after validating and normalizing the draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft is invalid, the document is already
    /// registered, or the insert fails.
    pub async fn create(&self, draft: ClientDraft) -> Result<clients::Model, ClientRepoError> {
        let draft = ClientService::prepare(draft)?;

        if self.find_by_document(&draft.document_number).await?.is_some() {
            return Err(ClientRepoError::DuplicateDocument(draft.document_number));
        }

        let now = chrono::Utc::now().into();
        let client = clients::ActiveModel {
            id: Set(Uuid::new_v4()),
            document_type: Set(draft.document_type.into()),
            document_number: Set(draft.document_number.clone()),
            full_name: Set(draft.full_name),
            address: Set(Some(draft.address)),
            phone: Set(Some(draft.phone)),
            email: Set(draft.email),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // A concurrent registration can still slip past the lookup above
        client.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                ClientRepoError::DuplicateDocument(draft.document_number)
            } else {
                e.into()
            }
        })
    }

    /// Finds a client by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the client does not exist.
    pub async fn get(&self, id: Uuid) -> Result<clients::Model, ClientRepoError> {
        clients::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ClientRepoError::NotFound(id))
    }

    /// Finds a client by document number.
    pub async fn find_by_document(
        &self,
        document_number: &str,
    ) -> Result<Option<clients::Model>, ClientRepoError> {
        let client = clients::Entity::find()
            .filter(clients::Column::DocumentNumber.eq(document_number.trim()))
            .one(&self.db)
            .await?;
        Ok(client)
    }

    /// Lists clients, newest first.
    pub async fn list(
        &self,
        page: PageRequest,
    ) -> Result<PageResponse<clients::Model>, ClientRepoError> {
        let page = page.normalized();
        let total = clients::Entity::find().count(&self.db).await?;
        let data = clients::Entity::find()
            .order_by_desc(clients::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }
}

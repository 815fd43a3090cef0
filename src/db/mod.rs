pub mod collections;
pub mod endpoints;
pub mod memory;
pub mod postgres;
pub mod users;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Collection, Endpoint, EndpointFields, NewUser, User};

pub use memory::MemoryDirectory;
pub use postgres::PgDirectory;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn list_collections(&self, owner_id: Uuid) -> Result<Vec<Collection>, StoreError>;

    async fn create_collection(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Collection, StoreError>;

    async fn get_collection(&self, id: Uuid, owner_id: Uuid)
    -> Result<Option<Collection>, StoreError>;

    async fn update_collection(
        &self,
        id: Uuid,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Option<Collection>, StoreError>;

    /// Cascades to the collection's endpoints.
    async fn delete_collection(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError>;

    async fn list_endpoints(
        &self,
        collection_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<Endpoint>, StoreError>;

    /// Returns `None` when the collection is not visible to `owner_id`.
    async fn create_endpoint(
        &self,
        collection_id: Uuid,
        owner_id: Uuid,
        fields: &EndpointFields,
    ) -> Result<Option<Endpoint>, StoreError>;

    async fn get_endpoint(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Endpoint>, StoreError>;

    async fn update_endpoint(
        &self,
        id: Uuid,
        owner_id: Uuid,
        fields: &EndpointFields,
    ) -> Result<Option<Endpoint>, StoreError>;

    async fn delete_endpoint(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError>;
}

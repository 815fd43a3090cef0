use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Directory, StoreError, collections, endpoints, users};
use crate::models::{Collection, Endpoint, EndpointFields, NewUser, User};

#[derive(Debug, Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        users::create(&self.pool, &user).await.map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                if db_err.constraint().is_some_and(|c| c.contains("email")) {
                    StoreError::Conflict("Email already registered".to_string())
                } else {
                    StoreError::Conflict("Username already registered".to_string())
                }
            }
            _ => StoreError::Database(e),
        })
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        Ok(users::find_by_login(&self.pool, login).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(users::find_by_id(&self.pool, id).await?)
    }

    async fn list_collections(&self, owner_id: Uuid) -> Result<Vec<Collection>, StoreError> {
        Ok(collections::list(&self.pool, owner_id).await?)
    }

    async fn create_collection(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Collection, StoreError> {
        Ok(collections::create(&self.pool, owner_id, name, description).await?)
    }

    async fn get_collection(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Collection>, StoreError> {
        Ok(collections::find_by_id(&self.pool, id, owner_id).await?)
    }

    async fn update_collection(
        &self,
        id: Uuid,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Option<Collection>, StoreError> {
        Ok(collections::update(&self.pool, id, owner_id, name, description).await?)
    }

    async fn delete_collection(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        Ok(collections::delete(&self.pool, id, owner_id).await?)
    }

    async fn list_endpoints(
        &self,
        collection_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<Endpoint>, StoreError> {
        Ok(endpoints::list_by_collection(&self.pool, collection_id, owner_id).await?)
    }

    async fn create_endpoint(
        &self,
        collection_id: Uuid,
        owner_id: Uuid,
        fields: &EndpointFields,
    ) -> Result<Option<Endpoint>, StoreError> {
        Ok(endpoints::create(&self.pool, collection_id, owner_id, fields).await?)
    }

    async fn get_endpoint(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Endpoint>, StoreError> {
        Ok(endpoints::find_by_id_scoped(&self.pool, id, owner_id).await?)
    }

    async fn update_endpoint(
        &self,
        id: Uuid,
        owner_id: Uuid,
        fields: &EndpointFields,
    ) -> Result<Option<Endpoint>, StoreError> {
        Ok(endpoints::update(&self.pool, id, owner_id, fields).await?)
    }

    async fn delete_endpoint(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        Ok(endpoints::delete(&self.pool, id, owner_id).await?)
    }
}

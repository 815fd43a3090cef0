use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sqlx::types::Json;
use uuid::Uuid;

use super::{Directory, StoreError};
use crate::models::{Collection, Endpoint, EndpointFields, NewUser, User};

/// Writes swap in whole records; readers never see a partial update.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: DashMap<Uuid, User>,
    /// lowercased username -> user id
    usernames: DashMap<String, Uuid>,
    /// lowercased email -> user id
    emails: DashMap<String, Uuid>,
    collections: DashMap<Uuid, Collection>,
    endpoints: DashMap<Uuid, Endpoint>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn owns(&self, collection_id: Uuid, owner_id: Uuid) -> bool {
        self.collections
            .get(&collection_id)
            .is_some_and(|c| c.owner_id == owner_id)
    }

    fn visible_endpoint(&self, id: Uuid, owner_id: Uuid) -> Option<Endpoint> {
        // Clone out before touching `collections` so no two shard locks are held at once
        let endpoint = self.endpoints.get(&id).map(|e| e.clone())?;
        self.owns(endpoint.collection_id, owner_id).then_some(endpoint)
    }
}

fn endpoint_from_fields(id: Uuid, collection_id: Uuid, fields: &EndpointFields) -> Endpoint {
    let now = Utc::now();
    Endpoint {
        id,
        collection_id,
        name: fields.name.clone(),
        url: fields.url.clone(),
        method: fields.method.clone(),
        headers: fields.headers.clone().map(Json),
        body: fields.body.clone(),
        fail_rate: fields.fail_rate,
        min_latency: fields.min_latency,
        max_latency: fields.max_latency,
        sandbox: fields.sandbox,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let id = Uuid::now_v7();
        let username_key = user.username.to_lowercase();
        let email_key = user.email.to_lowercase();

        match self.usernames.entry(username_key.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::Conflict("Username already registered".to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        match self.emails.entry(email_key) {
            Entry::Occupied(_) => {
                self.usernames.remove(&username_key);
                return Err(StoreError::Conflict("Email already registered".to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let record = User {
            id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            disabled: false,
            created_at: Utc::now(),
        };
        self.users.insert(id, record.clone());
        Ok(record)
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        let key = login.to_lowercase();
        let id = self
            .usernames
            .get(&key)
            .or_else(|| self.emails.get(&key))
            .map(|id| *id);
        Ok(id.and_then(|id| self.users.get(&id).map(|u| u.clone())))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn list_collections(&self, owner_id: Uuid) -> Result<Vec<Collection>, StoreError> {
        let mut found: Vec<Collection> = self
            .collections
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .map(|c| c.clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn create_collection(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Collection, StoreError> {
        let now = Utc::now();
        let collection = Collection {
            id: Uuid::now_v7(),
            owner_id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        self.collections.insert(collection.id, collection.clone());
        Ok(collection)
    }

    async fn get_collection(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Collection>, StoreError> {
        Ok(self
            .collections
            .get(&id)
            .filter(|c| c.owner_id == owner_id)
            .map(|c| c.clone()))
    }

    async fn update_collection(
        &self,
        id: Uuid,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Option<Collection>, StoreError> {
        let Some(mut entry) = self.collections.get_mut(&id) else {
            return Ok(None);
        };
        if entry.owner_id != owner_id {
            return Ok(None);
        }

        let updated = Collection {
            name: name.to_string(),
            description: description.map(str::to_string),
            updated_at: Utc::now(),
            ..entry.clone()
        };
        *entry = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_collection(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        let removed = self
            .collections
            .remove_if(&id, |_, c| c.owner_id == owner_id)
            .is_some();
        if removed {
            self.endpoints.retain(|_, e| e.collection_id != id);
        }
        Ok(removed)
    }

    async fn list_endpoints(
        &self,
        collection_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<Endpoint>, StoreError> {
        if !self.owns(collection_id, owner_id) {
            return Ok(Vec::new());
        }
        let mut found: Vec<Endpoint> = self
            .endpoints
            .iter()
            .filter(|e| e.collection_id == collection_id)
            .map(|e| e.clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn create_endpoint(
        &self,
        collection_id: Uuid,
        owner_id: Uuid,
        fields: &EndpointFields,
    ) -> Result<Option<Endpoint>, StoreError> {
        // Holding the collection guard keeps a concurrent cascade delete from
        // running between the ownership check and the insert.
        let Some(collection) = self.collections.get(&collection_id) else {
            return Ok(None);
        };
        if collection.owner_id != owner_id {
            return Ok(None);
        }

        let endpoint = endpoint_from_fields(Uuid::now_v7(), collection_id, fields);
        self.endpoints.insert(endpoint.id, endpoint.clone());
        drop(collection);
        Ok(Some(endpoint))
    }

    async fn get_endpoint(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Endpoint>, StoreError> {
        Ok(self.visible_endpoint(id, owner_id))
    }

    async fn update_endpoint(
        &self,
        id: Uuid,
        owner_id: Uuid,
        fields: &EndpointFields,
    ) -> Result<Option<Endpoint>, StoreError> {
        let Some(current) = self.visible_endpoint(id, owner_id) else {
            return Ok(None);
        };

        let updated = Endpoint {
            created_at: current.created_at,
            ..endpoint_from_fields(id, current.collection_id, fields)
        };
        match self.endpoints.get_mut(&id) {
            Some(mut entry) => {
                *entry = updated.clone();
                Ok(Some(updated))
            }
            // Deleted between the lookup and the write
            None => Ok(None),
        }
    }

    async fn delete_endpoint(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        if self.visible_endpoint(id, owner_id).is_none() {
            return Ok(false);
        }
        Ok(self.endpoints.remove(&id).is_some())
    }
}

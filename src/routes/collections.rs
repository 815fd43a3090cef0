use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::Collection;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CollectionPayload {
    pub name: String,
    pub description: Option<String>,
}

impl CollectionPayload {
    fn validate(&self) -> Result<(), AppError> {
        let name = self.name.trim();
        if name.is_empty() || name.len() > 200 {
            return Err(AppError::BadRequest(
                "Name must be between 1 and 200 characters".to_string(),
            ));
        }
        Ok(())
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Collection not found".to_string())
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Collection>>, AppError> {
    let collections = state.directory.list_collections(auth.user_id).await?;
    Ok(Json(collections))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CollectionPayload>,
) -> Result<Json<Collection>, AppError> {
    req.validate()?;

    let collection = state
        .directory
        .create_collection(auth.user_id, req.name.trim(), req.description.as_deref())
        .await?;

    tracing::info!(user = %auth.username, collection_id = %collection.id, "Collection created");
    Ok(Json(collection))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Collection>, AppError> {
    let collection = state
        .directory
        .get_collection(id, auth.user_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(collection))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CollectionPayload>,
) -> Result<Json<Collection>, AppError> {
    req.validate()?;

    let collection = state
        .directory
        .update_collection(id, auth.user_id, req.name.trim(), req.description.as_deref())
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(user = %auth.username, collection_id = %id, "Collection updated");
    Ok(Json(collection))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.directory.delete_collection(id, auth.user_id).await? {
        return Err(not_found());
    }

    tracing::info!(user = %auth.username, collection_id = %id, "Collection deleted");
    Ok(Json(serde_json::json!({ "message": "Collection deleted successfully" })))
}

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::chaos::{ChaosParams, FailRate};
use crate::error::AppError;
use crate::models::{Endpoint, EndpointFields};
use crate::proxy::target;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct EndpointPayload {
    pub name: String,
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    pub headers: Option<BTreeMap<String, String>>,
    pub body: Option<serde_json::Value>,
    /// Percent, 0..=100.
    #[serde(default)]
    pub fail_rate: i64,
    #[serde(default)]
    pub min_latency: i64,
    #[serde(default = "default_max_latency")]
    pub max_latency: i64,
    #[serde(default)]
    pub sandbox: bool,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_max_latency() -> i64 {
    1000
}

impl EndpointPayload {
    /// Same rules the proxy enforces, so every stored endpoint is forwardable.
    pub fn validate(self) -> Result<EndpointFields, AppError> {
        let name = self.name.trim();
        if name.is_empty() || name.len() > 200 {
            return Err(AppError::BadRequest(
                "Name must be between 1 and 200 characters".to_string(),
            ));
        }

        target::parse_url(&self.url)?;
        let method = target::parse_method(&self.method)?;
        if let Some(headers) = &self.headers {
            target::parse_headers(headers)?;
        }

        let fail_rate = FailRate::from_percent(self.fail_rate)?;
        ChaosParams::new(self.min_latency, self.max_latency, fail_rate)?;

        Ok(EndpointFields {
            name: name.to_string(),
            url: self.url.trim().to_string(),
            method: method.as_str().to_string(),
            headers: self.headers,
            body: self.body,
            // Bounded to 0..=100 by `from_percent`
            fail_rate: i32::try_from(self.fail_rate).unwrap_or_default(),
            min_latency: self.min_latency,
            max_latency: self.max_latency,
            sandbox: self.sandbox,
        })
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Endpoint not found".to_string())
}

pub async fn list_by_collection(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(collection_id): Path<Uuid>,
) -> Result<Json<Vec<Endpoint>>, AppError> {
    // Verify collection belongs to caller
    state
        .directory
        .get_collection(collection_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

    let endpoints = state
        .directory
        .list_endpoints(collection_id, auth.user_id)
        .await?;
    Ok(Json(endpoints))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(collection_id): Path<Uuid>,
    Json(req): Json<EndpointPayload>,
) -> Result<Json<Endpoint>, AppError> {
    let fields = req.validate()?;

    let endpoint = state
        .directory
        .create_endpoint(collection_id, auth.user_id, &fields)
        .await?
        .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

    tracing::info!(user = %auth.username, endpoint_id = %endpoint.id, "Endpoint created");
    Ok(Json(endpoint))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Endpoint>, AppError> {
    let endpoint = state
        .directory
        .get_endpoint(id, auth.user_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(endpoint))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EndpointPayload>,
) -> Result<Json<Endpoint>, AppError> {
    let fields = req.validate()?;

    let endpoint = state
        .directory
        .update_endpoint(id, auth.user_id, &fields)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(user = %auth.username, endpoint_id = %id, "Endpoint updated");
    Ok(Json(endpoint))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.directory.delete_endpoint(id, auth.user_id).await? {
        return Err(not_found());
    }

    tracing::info!(user = %auth.username, endpoint_id = %id, "Endpoint deleted");
    Ok(Json(serde_json::json!({ "message": "Endpoint deleted successfully" })))
}

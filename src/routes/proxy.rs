use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::BearerCredential;
use crate::error::AppError;
use crate::proxy::AdHocRequest;
use crate::state::SharedState;

/// `endpoint_id` (authenticated) or `url` plus chaos parameters (anonymous).
#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub endpoint_id: Option<Uuid>,
    pub url: Option<String>,
    #[serde(default)]
    pub min_latency: i64,
    #[serde(default)]
    pub max_latency: i64,
    /// Probability, 0.0..=1.0.
    #[serde(default)]
    pub fail_rate: f64,
    #[serde(default)]
    pub sandbox: bool,
}

pub async fn proxy(
    BearerCredential(token): BearerCredential,
    State(state): State<SharedState>,
    query: Result<Query<ProxyQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let resp = match (query.endpoint_id, query.url.as_deref()) {
        (Some(endpoint_id), None) => {
            // Only stored mode looks at credentials; ad-hoc calls ignore them
            let requester = match token {
                Some(token) => Some(state.identity.validate_token(&token).await?.id),
                None => None,
            };
            state
                .forwarder
                .forward(state.directory.as_ref(), endpoint_id, requester)
                .await?
        }
        (None, Some(url)) => {
            let request = AdHocRequest::new(
                url,
                query.min_latency,
                query.max_latency,
                query.fail_rate,
                query.sandbox,
            )?;
            state.forwarder.forward_adhoc(&request).await?
        }
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest(
                "Provide either endpoint_id or url, not both".to_string(),
            ));
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "Either endpoint_id or url is required".to_string(),
            ));
        }
    };

    // Downstream status is mirrored as-is; only transport failures become 502
    let status = StatusCode::from_u16(resp.status_code).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(resp)).into_response())
}

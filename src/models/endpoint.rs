use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::chaos::{ChaosParams, FailRate};
use crate::proxy::ProxyError;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: Uuid,
    pub collection_id: Uuid,
    pub name: String,
    pub url: String,
    pub method: String,
    pub headers: Option<Json<BTreeMap<String, String>>>,
    pub body: Option<serde_json::Value>,
    /// Percent, 0..=100.
    pub fail_rate: i32,
    pub min_latency: i64,
    pub max_latency: i64,
    pub sandbox: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Endpoint {
    /// Only fails for rows edited outside the service.
    pub fn chaos(&self) -> Result<ChaosParams, ProxyError> {
        ChaosParams::new(
            self.min_latency,
            self.max_latency,
            FailRate::from_percent(i64::from(self.fail_rate))?,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointFields {
    pub name: String,
    pub url: String,
    pub method: String,
    pub headers: Option<BTreeMap<String, String>>,
    pub body: Option<serde_json::Value>,
    pub fail_rate: i32,
    pub min_latency: i64,
    pub max_latency: i64,
    pub sandbox: bool,
}

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{Endpoint, EndpointFields};

pub async fn list_by_collection(
    pool: &PgPool,
    collection_id: Uuid,
    owner_id: Uuid,
) -> Result<Vec<Endpoint>, sqlx::Error> {
    sqlx::query_as::<_, Endpoint>(
        "SELECT e.* FROM endpoints e
         JOIN collections c ON e.collection_id = c.id
         WHERE e.collection_id = $1 AND c.owner_id = $2
         ORDER BY e.created_at DESC",
    )
    .bind(collection_id)
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

/// Inserts only when the collection belongs to `owner_id`.
pub async fn create(
    pool: &PgPool,
    collection_id: Uuid,
    owner_id: Uuid,
    fields: &EndpointFields,
) -> Result<Option<Endpoint>, sqlx::Error> {
    sqlx::query_as::<_, Endpoint>(
        "INSERT INTO endpoints
            (id, collection_id, name, url, method, headers, body,
             fail_rate, min_latency, max_latency, sandbox)
         SELECT $1, c.id, $3, $4, $5, $6, $7, $8, $9, $10, $11
         FROM collections c WHERE c.id = $2 AND c.owner_id = $12
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(collection_id)
    .bind(&fields.name)
    .bind(&fields.url)
    .bind(&fields.method)
    .bind(fields.headers.as_ref().map(Json))
    .bind(fields.body.as_ref())
    .bind(fields.fail_rate)
    .bind(fields.min_latency)
    .bind(fields.max_latency)
    .bind(fields.sandbox)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id_scoped(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
) -> Result<Option<Endpoint>, sqlx::Error> {
    sqlx::query_as::<_, Endpoint>(
        "SELECT e.* FROM endpoints e
         JOIN collections c ON e.collection_id = c.id
         WHERE e.id = $1 AND c.owner_id = $2",
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    fields: &EndpointFields,
) -> Result<Option<Endpoint>, sqlx::Error> {
    sqlx::query_as::<_, Endpoint>(
        "UPDATE endpoints SET
            name = $3, url = $4, method = $5, headers = $6, body = $7,
            fail_rate = $8, min_latency = $9, max_latency = $10, sandbox = $11,
            updated_at = now()
         WHERE id = $1 AND collection_id IN (SELECT id FROM collections WHERE owner_id = $2)
         RETURNING *",
    )
    .bind(id)
    .bind(owner_id)
    .bind(&fields.name)
    .bind(&fields.url)
    .bind(&fields.method)
    .bind(fields.headers.as_ref().map(Json))
    .bind(fields.body.as_ref())
    .bind(fields.fail_rate)
    .bind(fields.min_latency)
    .bind(fields.max_latency)
    .bind(fields.sandbox)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM endpoints WHERE id = $1 AND collection_id IN (SELECT id FROM collections WHERE owner_id = $2)",
    )
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Collection;

pub async fn list(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Collection>, sqlx::Error> {
    sqlx::query_as::<_, Collection>(
        "SELECT * FROM collections WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    owner_id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Collection, sqlx::Error> {
    sqlx::query_as::<_, Collection>(
        "INSERT INTO collections (id, owner_id, name, description)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
) -> Result<Option<Collection>, sqlx::Error> {
    sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Option<Collection>, sqlx::Error> {
    sqlx::query_as::<_, Collection>(
        "UPDATE collections SET name = $3, description = $4, updated_at = now()
         WHERE id = $1 AND owner_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await
}

/// Endpoints go with it through `ON DELETE CASCADE`.
pub async fn delete(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM collections WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

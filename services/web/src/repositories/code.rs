//! PostgreSQL generated-code store

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use uuid::Uuid;

use super::CodeStore;
use crate::models::{GeneratedCode, NewCode};

/// Generated code repository
#[derive(Clone)]
pub struct PgCodeStore {
    pool: PgPool,
}

impl PgCodeStore {
    /// Create a new code repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CodeStore for PgCodeStore {
    async fn create_code(&self, new_code: NewCode) -> DatabaseResult<GeneratedCode> {
        sqlx::query_as::<_, GeneratedCode>(
            r#"
            INSERT INTO qr_codes (id, source_url, image_payload, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, source_url, image_payload, owner_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_code.source_url)
        .bind(new_code.image_payload.into_inner())
        .bind(new_code.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<GeneratedCode>> {
        sqlx::query_as::<_, GeneratedCode>(
            r#"
            SELECT id, source_url, image_payload, owner_id, created_at
            FROM qr_codes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> DatabaseResult<Vec<GeneratedCode>> {
        sqlx::query_as::<_, GeneratedCode>(
            r#"
            SELECT id, source_url, image_payload, owner_id, created_at
            FROM qr_codes
            WHERE owner_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn delete_by_id(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM qr_codes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }
}

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{from_millis, to_millis};
use crate::{
    db::{error::DbResult, repos::AuditRepo},
    models::{AuditEntry, CreateAuditEntry},
};

pub struct SqliteAuditRepo {
    pool: SqlitePool,
}

impl SqliteAuditRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> DbResult<AuditEntry> {
        Ok(AuditEntry {
            uuid: row.try_get("uuid")?,
            category: row.try_get("category")?,
            operation: row.try_get("operation")?,
            entity_uuid: row.try_get("entity_uuid")?,
            entity_key: row.try_get("entity_key")?,
            entity_name: row.try_get("entity_name")?,
            qualifier: row.try_get("qualifier")?,
            created_at: from_millis(row.try_get("created_at")?)?,
        })
    }
}

#[async_trait]
impl AuditRepo for SqliteAuditRepo {
    async fn create(&self, input: CreateAuditEntry) -> DbResult<AuditEntry> {
        let uuid = Uuid::new_v4().to_string();
        // Stored at millisecond precision
        let created_at = from_millis(to_millis(input.created_at))?;

        sqlx::query(
            r#"
            INSERT INTO audits (
                uuid, category, operation, entity_uuid, entity_key,
                entity_name, qualifier, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&uuid)
        .bind(&input.category)
        .bind(&input.operation)
        .bind(&input.entity_uuid)
        .bind(&input.entity_key)
        .bind(&input.entity_name)
        .bind(&input.qualifier)
        .bind(to_millis(created_at))
        .execute(&self.pool)
        .await?;

        Ok(AuditEntry {
            uuid,
            category: input.category,
            operation: input.operation,
            entity_uuid: input.entity_uuid,
            entity_key: input.entity_key,
            entity_name: input.entity_name,
            qualifier: input.qualifier,
            created_at,
        })
    }

    async fn list_by_entity(&self, entity_uuid: &str) -> DbResult<Vec<AuditEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT uuid, category, operation, entity_uuid, entity_key,
                   entity_name, qualifier, created_at
            FROM audits
            WHERE entity_uuid = ?
            ORDER BY created_at ASC, uuid ASC
            "#,
        )
        .bind(entity_uuid)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audits")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

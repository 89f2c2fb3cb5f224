//! PostgreSQL search log store
//!
//! ```sql
//! search_log (id uuid primary key, criteria jsonb, entries jsonb, result_count bigint,
//!             total bigint, client_address text, started_at timestamptz,
//!             finished_at timestamptz, repository_counts jsonb)
//! ```

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use super::traits::AuditLogStore;
use crate::models::SearchLogEntry;
use crate::{Error, Result};

#[derive(Clone)]
pub struct PgAuditLogStore {
    pool: PgPool,
}

impl PgAuditLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogStore for PgAuditLogStore {
    async fn append(&self, entry: &SearchLogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO search_log
                (id, criteria, entries, result_count, total, client_address,
                 started_at, finished_at, repository_counts)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(entry.id)
        .bind(entry.criteria_json())
        .bind(Json(&entry.entries))
        .bind(entry.result_count)
        .bind(entry.total)
        .bind(entry.client_address.as_deref())
        .bind(entry.started_at)
        .bind(entry.finished_at)
        .bind(Json(&entry.repository_counts))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::AuditLog(e.to_string()))?;
        Ok(())
    }
}

//! PostgreSQL citation store
//!
//! Expected tables:
//!
//! ```sql
//! citations (id bigint primary key, repository text, resource jsonb, title text,
//!            current_state text, publisher text, artifact_type text,
//!            last_updated timestamptz, article_date timestamptz, published_date date,
//!            recommendation_strength int, evidence_quality int,
//!            content_tsv tsvector, keywords_tsv tsvector)
//! citation_concepts (citation_id bigint, concept_id text)
//! ```

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::search::sql::{build_count_sql, build_repository_count_sql, build_select_sql};
use super::search::{BindValue, CitationQuery};
use super::traits::CitationStore;
use crate::models::{ArtifactId, CitationRow};
use crate::{Error, Result};

macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                BindValue::Text(v) => query.bind(v),
                BindValue::TextArray(vs) => query.bind(vs),
                BindValue::BigIntArray(vs) => query.bind(vs),
                BindValue::IntArray(vs) => query.bind(vs),
                BindValue::Timestamp(v) => query.bind(v),
            };
        }
        query
    }};
}

#[derive(Clone)]
pub struct PgCitationStore {
    pool: PgPool,
}

impl PgCitationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_rows(&self, query: &CitationQuery, limit: Option<(i64, i64)>) -> Result<Vec<CitationRow>> {
        let (sql, bind_values) = build_select_sql(query, limit);
        tracing::trace!(sql = %sql, binds = bind_values.len(), "Citation select");

        let rows = bind_values!(sqlx::query(&sql), bind_values)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                Ok(CitationRow {
                    id: row.try_get("id")?,
                    repository: row.try_get("repository")?,
                    resource: row.try_get("resource")?,
                    score: row.try_get("score")?,
                })
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(Error::Database)
    }
}

#[async_trait]
impl CitationStore for PgCitationStore {
    async fn count(&self, query: &CitationQuery) -> Result<i64> {
        let (sql, bind_values) = build_count_sql(query);
        bind_values!(sqlx::query_scalar::<_, i64>(&sql), bind_values)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn page(&self, query: &CitationQuery, page: i64, size: i64) -> Result<(Vec<CitationRow>, i64)> {
        let total = self.count(query).await?;
        let offset = (page.max(1) - 1).saturating_mul(size);
        if offset >= total {
            return Ok((Vec::new(), total));
        }
        let rows = self.fetch_rows(query, Some((size, offset))).await?;
        Ok((rows, total))
    }

    async fn all(&self, query: &CitationQuery) -> Result<Vec<CitationRow>> {
        self.fetch_rows(query, None).await
    }

    async fn ids_classified_under(&self, concept_ids: &[String]) -> Result<HashSet<ArtifactId>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT citation_id FROM citation_concepts WHERE concept_id = ANY($1::text[])",
        )
        .bind(concept_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(ids.into_iter().collect())
    }

    async fn count_by_repository(&self, query: &CitationQuery) -> Result<BTreeMap<String, i64>> {
        let (sql, bind_values) = build_repository_count_sql(query);
        let rows = bind_values!(sqlx::query_as::<_, (String, i64)>(&sql), bind_values)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.into_iter().collect())
    }
}

//! PostgreSQL concept store
//!
//! ```sql
//! concepts (id text primary key, description text, synonyms text[], codes jsonb)
//! ```
//!
//! `codes` is an array of `{"system": ..., "code": ..., "description": ...}`.

use async_trait::async_trait;
use citeline_query::{Concept, ConceptCode};
use sqlx::types::Json;
use sqlx::PgPool;

use super::search::CodeQuery;
use super::traits::ConceptStore;
use crate::{Error, Result};

const CONCEPT_COLUMNS: &str = "id, description, synonyms, codes";

type ConceptRecord = (String, String, Vec<String>, Json<Vec<ConceptCode>>);

fn into_concept((id, description, synonyms, Json(codes)): ConceptRecord) -> Concept {
    Concept {
        id,
        description,
        synonyms,
        codes,
    }
}

#[derive(Clone)]
pub struct PgConceptStore {
    pool: PgPool,
}

impl PgConceptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConceptStore for PgConceptStore {
    async fn matching(&self, keys: &[String]) -> Result<Vec<Concept>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {CONCEPT_COLUMNS} FROM concepts
             WHERE EXISTS (
                 SELECT 1 FROM unnest(synonyms) AS s
                 WHERE regexp_replace(lower(replace(s, '<->', ' ')), '\\s+', ' ', 'g') = ANY($1::text[])
             )
             ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ConceptRecord>(&sql)
            .bind(keys)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.into_iter().map(into_concept).collect())
    }

    async fn with_code(&self, query: &CodeQuery) -> Result<Vec<Concept>> {
        let rows = match query {
            CodeQuery::Any(code) => {
                let sql = format!(
                    "SELECT {CONCEPT_COLUMNS} FROM concepts
                     WHERE id = $1 OR codes @> jsonb_build_array(jsonb_build_object('code', $1::text))
                     ORDER BY id"
                );
                sqlx::query_as::<_, ConceptRecord>(&sql)
                    .bind(code)
                    .fetch_all(&self.pool)
                    .await
            }
            CodeQuery::Identifiers(codes) => {
                if codes.is_empty() {
                    return Ok(Vec::new());
                }
                let sql = format!(
                    "SELECT {CONCEPT_COLUMNS} FROM concepts WHERE id = ANY($1::text[]) ORDER BY id"
                );
                sqlx::query_as::<_, ConceptRecord>(&sql)
                    .bind(codes)
                    .fetch_all(&self.pool)
                    .await
            }
            CodeQuery::SystemCode { systems, code } => {
                let sql = format!(
                    "SELECT {CONCEPT_COLUMNS} FROM concepts
                     WHERE EXISTS (
                         SELECT 1 FROM jsonb_array_elements(codes) AS e
                         WHERE e->>'system' = ANY($1::text[]) AND e->>'code' = $2
                     )
                     ORDER BY id"
                );
                sqlx::query_as::<_, ConceptRecord>(&sql)
                    .bind(systems)
                    .bind(code)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(into_concept).collect())
    }
}

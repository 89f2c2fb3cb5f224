//! PostgreSQL MeSH tree store
//!
//! ```sql
//! mesh_tree (tree_number text primary key, code text, name text,
//!            direct_count bigint, indirect_count bigint)
//! ```

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::MeshTreeStore;
use crate::models::MeshTreeNode;
use crate::{Error, Result};

type NodeRecord = (String, String, String, i64, i64);

fn into_node((code, tree_number, name, direct_count, indirect_count): NodeRecord) -> MeshTreeNode {
    MeshTreeNode {
        code,
        tree_number,
        name,
        direct_count,
        indirect_count,
    }
}

#[derive(Clone)]
pub struct PgMeshTreeStore {
    pool: PgPool,
}

impl PgMeshTreeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MeshTreeStore for PgMeshTreeStore {
    async fn by_codes(&self, codes: &[String]) -> Result<Vec<MeshTreeNode>> {
        let rows = sqlx::query_as::<_, NodeRecord>(
            "SELECT code, tree_number, name, direct_count, indirect_count
             FROM mesh_tree WHERE code = ANY($1::text[]) ORDER BY tree_number",
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(into_node).collect())
    }

    async fn below(&self, tree_numbers: &[String]) -> Result<Vec<MeshTreeNode>> {
        if tree_numbers.is_empty() {
            return Ok(Vec::new());
        }
        let patterns: Vec<String> = tree_numbers
            .iter()
            .map(|t| format!("{}.%", super::search::sql::escape_like_pattern(t)))
            .collect();
        let rows = sqlx::query_as::<_, NodeRecord>(
            "SELECT code, tree_number, name, direct_count, indirect_count
             FROM mesh_tree WHERE tree_number LIKE ANY($1::text[]) ORDER BY tree_number",
        )
        .bind(patterns)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(into_node).collect())
    }
}

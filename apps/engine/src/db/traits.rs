//! Collaborator traits consumed by the search engine
//!
//! The engine never talks to a database directly; it filters, counts and pages
//! through these traits. PostgreSQL implementations live next to this module,
//! tests use in-memory fakes.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use citeline_query::Concept;

use super::search::{CitationQuery, CodeQuery};
use crate::models::{ArtifactId, CitationRow, MeshTreeNode, SearchLogEntry};
use crate::Result;

/// Record store over citations.
#[async_trait]
pub trait CitationStore: Send + Sync {
    /// Number of citations matching the filter.
    async fn count(&self, query: &CitationQuery) -> Result<i64>;

    /// One 1-based page of ordered matches plus the total match count.
    async fn page(&self, query: &CitationQuery, page: i64, size: i64)
        -> Result<(Vec<CitationRow>, i64)>;

    /// Every ordered match.
    async fn all(&self, query: &CitationQuery) -> Result<Vec<CitationRow>>;

    /// Citations classified under any of the given concepts.
    async fn ids_classified_under(&self, concept_ids: &[String]) -> Result<HashSet<ArtifactId>>;

    /// Matches per originating repository.
    async fn count_by_repository(&self, _query: &CitationQuery) -> Result<BTreeMap<String, i64>> {
        Ok(BTreeMap::new())
    }
}

/// Concept reference data.
#[async_trait]
pub trait ConceptStore: Send + Sync {
    /// Concepts having a synonym equal to any of the lookup keys.
    async fn matching(&self, keys: &[String]) -> Result<Vec<Concept>>;

    /// Concepts carrying a code.
    async fn with_code(&self, query: &CodeQuery) -> Result<Vec<Concept>>;
}

/// MeSH hierarchy reference data.
#[async_trait]
pub trait MeshTreeStore: Send + Sync {
    /// Every placement of the given descriptor codes.
    async fn by_codes(&self, codes: &[String]) -> Result<Vec<MeshTreeNode>>;

    /// Every node strictly below any of the given tree numbers.
    async fn below(&self, tree_numbers: &[String]) -> Result<Vec<MeshTreeNode>>;
}

/// Persistence for search log entries.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn append(&self, entry: &SearchLogEntry) -> Result<()>;
}

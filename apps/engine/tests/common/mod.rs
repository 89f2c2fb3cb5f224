//! In-memory collaborators for engine tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use citeline::config::{Config, SearchConfig};
use citeline::db::search::{CitationQuery, CodeQuery, Column, FilterPredicate, SortKey};
use citeline::db::{AuditLogStore, CitationStore, ConceptStore, MeshTreeStore};
use citeline::models::{ArtifactId, CitationRow, CurrentState, MeshTreeNode, SearchLogEntry};
use citeline::services::{SearchAuditLogger, SearchService};
use citeline::{Error, Result};
use citeline_query::{Concept, ConceptCode, StopWords};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct StoredCitation {
    pub id: ArtifactId,
    pub state: String,
    pub repository: Option<String>,
    pub concepts: Vec<String>,
}

pub fn citation(id: ArtifactId, state: &str, concepts: &[&str]) -> StoredCitation {
    StoredCitation {
        id,
        state: state.to_string(),
        repository: Some("pubmed".to_string()),
        concepts: concepts.iter().map(|c| c.to_string()).collect(),
    }
}

/// Evaluates id and state filters and the frequency ordering; every other
/// predicate matches. Records each query it receives.
#[derive(Default)]
pub struct FakeCitationStore {
    pub citations: Vec<StoredCitation>,
    pub queries: Mutex<Vec<CitationQuery>>,
    pub delay: Option<Duration>,
}

impl FakeCitationStore {
    pub fn new(citations: Vec<StoredCitation>) -> Self {
        Self {
            citations,
            ..Default::default()
        }
    }

    fn matches(citation: &StoredCitation, predicate: &FilterPredicate) -> bool {
        match predicate {
            FilterPredicate::And(parts) => parts.iter().all(|p| Self::matches(citation, p)),
            FilterPredicate::Or(parts) => parts.iter().any(|p| Self::matches(citation, p)),
            FilterPredicate::IdIn(ids) => ids.contains(&citation.id),
            FilterPredicate::InSet {
                column: Column::CurrentState,
                values,
                ..
            } => values.contains(&citation.state),
            _ => true,
        }
    }

    async fn evaluate(&self, query: &CitationQuery) -> Vec<CitationRow> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.queries.lock().unwrap().push(query.clone());

        let frequency: HashMap<ArtifactId, u32> = query
            .rank
            .directives()
            .iter()
            .find_map(|d| match &d.key {
                SortKey::MatchFrequency(counts) => Some(counts.iter().copied().collect()),
                _ => None,
            })
            .unwrap_or_default();

        let mut matched: Vec<&StoredCitation> = self
            .citations
            .iter()
            .filter(|c| Self::matches(c, &query.filter))
            .collect();
        matched.sort_by_key(|c| {
            (
                std::cmp::Reverse(frequency.get(&c.id).copied().unwrap_or(0)),
                CurrentState::from_code(&c.state)
                    .map_or(CurrentState::UNRECOGNIZED_PRIORITY, |s| s.priority()),
                c.id,
            )
        });
        matched
            .into_iter()
            .map(|c| CitationRow {
                id: c.id,
                repository: c.repository.clone(),
                resource: json!({ "resourceType": "Citation", "id": c.id.to_string() }),
                score: None,
            })
            .collect()
    }
}

#[async_trait]
impl CitationStore for FakeCitationStore {
    async fn count(&self, query: &CitationQuery) -> Result<i64> {
        Ok(self.evaluate(query).await.len() as i64)
    }

    async fn page(&self, query: &CitationQuery, page: i64, size: i64) -> Result<(Vec<CitationRow>, i64)> {
        let rows = self.evaluate(query).await;
        let total = rows.len() as i64;
        let offset = ((page - 1) * size) as usize;
        Ok((rows.into_iter().skip(offset).take(size as usize).collect(), total))
    }

    async fn all(&self, query: &CitationQuery) -> Result<Vec<CitationRow>> {
        Ok(self.evaluate(query).await)
    }

    async fn ids_classified_under(&self, concept_ids: &[String]) -> Result<HashSet<ArtifactId>> {
        Ok(self
            .citations
            .iter()
            .filter(|c| c.concepts.iter().any(|id| concept_ids.contains(id)))
            .map(|c| c.id)
            .collect())
    }

    async fn count_by_repository(&self, query: &CitationQuery) -> Result<BTreeMap<String, i64>> {
        let mut counts = BTreeMap::new();
        for row in self.evaluate(query).await {
            if let Some(repository) = row.repository {
                *counts.entry(repository).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

pub fn concept(id: &str, synonyms: &[&str], codes: &[(&str, &str)]) -> Concept {
    Concept {
        id: id.to_string(),
        description: synonyms.first().unwrap_or(&id).to_string(),
        synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        codes: codes
            .iter()
            .map(|(system, code)| ConceptCode {
                system: system.to_string(),
                code: code.to_string(),
                description: None,
            })
            .collect(),
    }
}

#[derive(Default)]
pub struct FakeConceptStore {
    pub concepts: Vec<Concept>,
    pub code_queries: Mutex<Vec<CodeQuery>>,
}

impl FakeConceptStore {
    pub fn new(concepts: Vec<Concept>) -> Self {
        Self {
            concepts,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ConceptStore for FakeConceptStore {
    async fn matching(&self, keys: &[String]) -> Result<Vec<Concept>> {
        Ok(self
            .concepts
            .iter()
            .filter(|c| {
                c.normalized_synonyms()
                    .iter()
                    .any(|words| keys.contains(&words.join(" ")))
            })
            .cloned()
            .collect())
    }

    async fn with_code(&self, query: &CodeQuery) -> Result<Vec<Concept>> {
        self.code_queries.lock().unwrap().push(query.clone());
        Ok(self
            .concepts
            .iter()
            .filter(|c| match query {
                CodeQuery::Any(code) => &c.id == code || c.codes.iter().any(|cc| &cc.code == code),
                CodeQuery::Identifiers(codes) => codes.contains(&c.id),
                CodeQuery::SystemCode { systems, code } => c
                    .codes
                    .iter()
                    .any(|cc| systems.contains(&cc.system) && &cc.code == code),
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeMeshTreeStore {
    pub nodes: Vec<MeshTreeNode>,
}

pub fn mesh_node(code: &str, tree_number: &str) -> MeshTreeNode {
    MeshTreeNode {
        code: code.to_string(),
        tree_number: tree_number.to_string(),
        name: code.to_lowercase(),
        direct_count: 0,
        indirect_count: 0,
    }
}

#[async_trait]
impl MeshTreeStore for FakeMeshTreeStore {
    async fn by_codes(&self, codes: &[String]) -> Result<Vec<MeshTreeNode>> {
        Ok(self.nodes.iter().filter(|n| codes.contains(&n.code)).cloned().collect())
    }

    async fn below(&self, tree_numbers: &[String]) -> Result<Vec<MeshTreeNode>> {
        Ok(self
            .nodes
            .iter()
            .filter(|n| {
                tree_numbers
                    .iter()
                    .any(|t| n.tree_number.starts_with(&format!("{t}.")))
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingAuditLog {
    pub entries: Mutex<Vec<SearchLogEntry>>,
}

#[async_trait]
impl AuditLogStore for RecordingAuditLog {
    async fn append(&self, entry: &SearchLogEntry) -> Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

pub struct FailingAuditLog;

#[async_trait]
impl AuditLogStore for FailingAuditLog {
    async fn append(&self, _entry: &SearchLogEntry) -> Result<()> {
        Err(Error::AuditLog("search_log is read-only".into()))
    }
}

pub fn test_config() -> Config {
    Config::defaults().expect("default config")
}

pub fn search_config() -> SearchConfig {
    test_config().search
}

pub struct Harness {
    pub citations: Arc<FakeCitationStore>,
    pub concepts: Arc<FakeConceptStore>,
    pub mesh: Arc<FakeMeshTreeStore>,
    pub audit: Arc<RecordingAuditLog>,
    pub service: SearchService,
}

impl Harness {
    pub fn new(citations: FakeCitationStore, concepts: FakeConceptStore, mesh: FakeMeshTreeStore) -> Self {
        let config = test_config();
        let citations = Arc::new(citations);
        let concepts = Arc::new(concepts);
        let mesh = Arc::new(mesh);
        let audit = Arc::new(RecordingAuditLog::default());
        let service = SearchService::new(
            citations.clone(),
            concepts.clone(),
            mesh.clone(),
            SearchAuditLogger::new(audit.clone(), &config.audit),
            Arc::new(StopWords::english()),
            config.search,
        );
        Self {
            citations,
            concepts,
            mesh,
            audit,
            service,
        }
    }

    pub fn with_citations(citations: Vec<StoredCitation>) -> Self {
        Self::new(
            FakeCitationStore::new(citations),
            FakeConceptStore::default(),
            FakeMeshTreeStore::default(),
        )
    }

    pub fn last_query(&self) -> CitationQuery {
        self.citations
            .queries
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no query issued")
    }
}

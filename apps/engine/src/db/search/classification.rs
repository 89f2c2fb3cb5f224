//! Classification matching
//!
//! Each classification term resolves to the set of citations classified under
//! the matching concepts. Terms separated by commas in one occurrence are
//! unioned; separate occurrences are intersected. Independently of that set
//! algebra every individual lookup adds one to the frequency of each id it
//! returned, so citations matching more terms rank first.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use citeline_query::{lookup_key, Concept};

use super::escape::{split_unescaped, unescape_or_raw};
use crate::config::SearchConfig;
use crate::db::traits::{CitationStore, ConceptStore, MeshTreeStore};
use crate::db::with_timeout;
use crate::models::{ArtifactId, MeshTree};
use crate::Result;

/// How a classification code is matched against concepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeQuery {
    /// No system: an embedded code or the primary identifier.
    Any(String),
    /// Primary identifiers (canonical thesaurus codes).
    Identifiers(Vec<String>),
    /// Embedded `{system, code}` pairs under any of `systems`.
    SystemCode { systems: Vec<String>, code: String },
}

impl CodeQuery {
    /// Interpret `code` or `system|code`, where `token` still carries its
    /// search escapes (`\|` is a literal pipe).
    pub fn from_token(token: &str, config: &SearchConfig) -> Self {
        let (system, code) = split_system_code(token);

        if system.is_empty() {
            return CodeQuery::Any(code);
        }
        if config.mesh_systems.contains(&system) {
            return CodeQuery::Identifiers(vec![code]);
        }
        let localized = config.localized_systems.get(&system).cloned();
        let mut systems = vec![system];
        systems.extend(localized);
        CodeQuery::SystemCode { systems, code }
    }
}

/// Split an escaped `system|code` token on its unescaped pipe, then unescape
/// both halves. Without exactly one such pipe the whole token is the code.
fn split_system_code(token: &str) -> (String, String) {
    let parts = split_unescaped(token, '|');
    let (system, code) = match parts.as_slice() {
        [system, code] => (*system, *code),
        _ => ("", token),
    };
    (
        unescape_or_raw(system).trim().to_string(),
        unescape_or_raw(code).trim().to_string(),
    )
}

/// One `classification` or `classification:below` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// OR-ed terms, search escapes intact
    pub terms: Vec<String>,
    /// Expand each term to its MeSH subtree.
    pub below: bool,
}

/// Combined result of every classification occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationMatch {
    pub ids: HashSet<ArtifactId>,
    /// Number of individual lookups each id appeared in.
    pub frequency: HashMap<ArtifactId, u32>,
}

impl ClassificationMatch {
    /// Matching ids in ascending order.
    pub fn sorted_ids(&self) -> Vec<ArtifactId> {
        let mut ids: Vec<ArtifactId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Union within each occurrence, intersection across occurrences; frequency
/// counts every lookup.
pub fn combine_occurrences(lookups: &[Vec<HashSet<ArtifactId>>]) -> ClassificationMatch {
    let mut frequency: HashMap<ArtifactId, u32> = HashMap::new();
    let mut combined: Option<HashSet<ArtifactId>> = None;

    for occurrence in lookups {
        let mut union = HashSet::new();
        for ids in occurrence {
            for id in ids {
                *frequency.entry(*id).or_insert(0) += 1;
            }
            union.extend(ids.iter().copied());
        }
        combined = Some(match combined {
            None => union,
            Some(acc) => acc.intersection(&union).copied().collect(),
        });
    }

    ClassificationMatch {
        ids: combined.unwrap_or_default(),
        frequency,
    }
}

/// Resolves classification terms through the concept, MeSH and citation stores.
pub struct ClassificationMatcher<'a> {
    citations: &'a dyn CitationStore,
    concepts: &'a dyn ConceptStore,
    mesh: &'a dyn MeshTreeStore,
    config: &'a SearchConfig,
    timeout: Duration,
}

impl<'a> ClassificationMatcher<'a> {
    pub fn new(
        citations: &'a dyn CitationStore,
        concepts: &'a dyn ConceptStore,
        mesh: &'a dyn MeshTreeStore,
        config: &'a SearchConfig,
    ) -> Self {
        Self {
            citations,
            concepts,
            mesh,
            config,
            timeout: config.store_timeout(),
        }
    }

    pub async fn match_occurrences(&self, occurrences: &[Occurrence]) -> Result<ClassificationMatch> {
        let mut lookups = Vec::with_capacity(occurrences.len());
        for occurrence in occurrences {
            let mut sets = Vec::with_capacity(occurrence.terms.len());
            for term in &occurrence.terms {
                let ids = if occurrence.below {
                    self.ids_below(term).await?
                } else {
                    self.ids_for_term(term).await?
                };
                tracing::debug!(term = %term, below = occurrence.below, matches = ids.len(), "Classification lookup");
                sets.push(ids);
            }
            lookups.push(sets);
        }
        Ok(combine_occurrences(&lookups))
    }

    /// Citations classified under concepts carrying `term` as a code, or as a
    /// synonym when no code matches and no system was given.
    pub async fn ids_for_term(&self, term: &str) -> Result<HashSet<ArtifactId>> {
        let query = CodeQuery::from_token(term, self.config);
        let mut concepts = with_timeout(self.timeout, "concepts.with_code", self.concepts.with_code(&query)).await?;

        if let (true, CodeQuery::Any(text)) = (concepts.is_empty(), &query) {
            let words: Vec<&str> = text.split_whitespace().collect();
            let key = lookup_key(&words);
            if !key.is_empty() {
                concepts = with_timeout(self.timeout, "concepts.matching", self.concepts.matching(&[key])).await?;
            }
        }

        self.ids_for_concepts(&concepts).await
    }

    /// Citations classified under a MeSH descriptor or anything below it.
    pub async fn ids_below(&self, term: &str) -> Result<HashSet<ArtifactId>> {
        let (_, code) = split_system_code(term);
        if code.is_empty() {
            return Ok(HashSet::new());
        }

        let placements = with_timeout(self.timeout, "mesh.by_codes", self.mesh.by_codes(&[code.clone()])).await?;
        let tree_numbers: Vec<String> = placements.iter().map(|n| n.tree_number.clone()).collect();
        let mut nodes = placements;
        if !tree_numbers.is_empty() {
            nodes.extend(with_timeout(self.timeout, "mesh.below", self.mesh.below(&tree_numbers)).await?);
        }

        let tree = MeshTree::new(nodes);
        let codes: Vec<String> = tree.subtree_codes(&[code]).into_iter().collect();
        let concepts = with_timeout(
            self.timeout,
            "concepts.with_code",
            self.concepts.with_code(&CodeQuery::Identifiers(codes)),
        )
        .await?;
        self.ids_for_concepts(&concepts).await
    }

    async fn ids_for_concepts(&self, concepts: &[Concept]) -> Result<HashSet<ArtifactId>> {
        if concepts.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<String> = concepts.iter().map(|c| c.id.clone()).collect();
        with_timeout(
            self.timeout,
            "citations.ids_classified_under",
            self.citations.ids_classified_under(&ids),
        )
        .await
    }
}

//! Synonym expansion over a parsed query
//!
//! Expansion is a separate pass from parsing and runs in two phases so that it
//! stays pure:
//!
//! 1. [`SynonymResolver::lookup_keys`] lists every key the query needs looked up.
//! 2. The caller fetches the matching concepts (usually from a database) and wraps
//!    them in a [`ConceptIndex`].
//! 3. [`SynonymResolver::resolve`] rewrites `Term` and `Phrase` leaves into
//!    `SynonymSet`s using only that snapshot.
//!
//! Lookup keys are lower-case words joined by single spaces (`"lung cancer"`).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ast::{Alternative, QueryNode};
use crate::parser::ParsedQuery;
use crate::stopwords::StopWords;

/// Adjacency marker used by stored synonyms.
const ADJACENCY: &str = "<->";

/// A coded representation of a concept in some code system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptCode {
    pub system: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A normalized clinical term with its synonyms and cross-system codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    /// Stable primary identifier.
    pub id: String,
    pub description: String,
    /// Stored synonyms. Multi-word entries may use spaces or the `<->` marker.
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub codes: Vec<ConceptCode>,
}

impl Concept {
    /// Synonyms as word lists: lower-cased, de-duplicated, in stored order.
    ///
    /// Operator markers (`&`, `|`, `!`) left next to an adjacency marker by
    /// upstream tooling are removed.
    pub fn normalized_synonyms(&self) -> Vec<Vec<String>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for synonym in &self.synonyms {
            let words = synonym_words(synonym);
            if words.is_empty() {
                continue;
            }
            if seen.insert(words.join(" ")) {
                out.push(words);
            }
        }
        out
    }
}

fn synonym_words(synonym: &str) -> Vec<String> {
    synonym
        .to_lowercase()
        .replace(ADJACENCY, " ")
        .split_whitespace()
        .map(|w| w.trim_matches(|c| matches!(c, '&' | '|' | '!')))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lookup key for a sequence of words.
pub fn lookup_key<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| w.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// In-memory snapshot of concepts, indexed by synonym key.
#[derive(Debug, Clone, Default)]
pub struct ConceptIndex {
    concepts: Vec<Concept>,
    by_key: HashMap<String, Vec<usize>>,
}

impl ConceptIndex {
    pub fn new(concepts: Vec<Concept>) -> Self {
        let mut index = Self::default();
        for concept in concepts {
            index.insert(concept);
        }
        index
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a concept. A concept already present (same id) is ignored.
    pub fn insert(&mut self, concept: Concept) {
        if self.concepts.iter().any(|c| c.id == concept.id) {
            return;
        }
        let idx = self.concepts.len();
        for words in concept.normalized_synonyms() {
            let slots = self.by_key.entry(words.join(" ")).or_default();
            if !slots.contains(&idx) {
                slots.push(idx);
            }
        }
        self.concepts.push(concept);
    }

    /// Concepts with a synonym equal to `key` (see [`lookup_key`]).
    pub fn lookup(&self, key: &str) -> Vec<&Concept> {
        self.by_key
            .get(key)
            .map(|idxs| idxs.iter().map(|&i| &self.concepts[i]).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

/// True when a word has a hyphen between two other characters.
fn has_internal_hyphen(word: &str) -> bool {
    word.trim_matches('-').contains('-')
}

/// Spellings of a word sequence tried against the concept store: as written,
/// with internal hyphens removed, and with hyphens turned into adjacency.
fn word_forms(words: &[String]) -> Vec<Vec<String>> {
    let mut forms = vec![words.to_vec()];
    if words.iter().any(|w| has_internal_hyphen(w)) {
        let joined = words
            .iter()
            .map(|w| {
                if has_internal_hyphen(w) {
                    let trimmed = w.trim_matches('-');
                    let lead = &w[..w.len() - w.trim_start_matches('-').len()];
                    format!("{lead}{}", trimmed.replace('-', ""))
                } else {
                    w.clone()
                }
            })
            .collect();
        let split = words
            .iter()
            .flat_map(|w| {
                if has_internal_hyphen(w) {
                    w.split('-')
                        .filter(|part| !part.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                } else {
                    vec![w.clone()]
                }
            })
            .collect();
        forms.push(joined);
        forms.push(split);
    }
    let mut seen = HashSet::new();
    forms.retain(|f| seen.insert(lookup_key(f)));
    forms
}

/// Expands terms and phrases into synonym sets.
#[derive(Debug, Clone, Copy)]
pub struct SynonymResolver<'a> {
    stop_words: &'a StopWords,
}

impl<'a> SynonymResolver<'a> {
    pub fn new(stop_words: &'a StopWords) -> Self {
        Self { stop_words }
    }

    /// Every key [`Self::resolve`] will look up, de-duplicated, in query order.
    pub fn lookup_keys(&self, parsed: &ParsedQuery) -> Vec<String> {
        let mut keys = Vec::new();
        if let Some(root) = &parsed.root {
            self.collect_keys(root, &mut keys);
        }
        if parsed.state.is_simple() {
            for form in word_forms(&parsed.state.terms) {
                keys.push(lookup_key(&form));
            }
        }
        let mut seen = HashSet::new();
        keys.retain(|k| seen.insert(k.clone()));
        keys
    }

    fn collect_keys(&self, node: &QueryNode, keys: &mut Vec<String>) {
        match node {
            QueryNode::Term(term) => {
                if !self.stop_words.contains(term) {
                    keys.extend(word_forms(&[term.clone()]).iter().map(|f| lookup_key(f)));
                }
            }
            QueryNode::Phrase(words) => {
                keys.extend(word_forms(words).iter().map(|f| lookup_key(f)));
            }
            QueryNode::SynonymSet(_) => {}
            QueryNode::BinaryOp { left, right, .. } => {
                self.collect_keys(left, keys);
                self.collect_keys(right, keys);
            }
            QueryNode::Not(child) | QueryNode::Group(child) => self.collect_keys(child, keys),
        }
    }

    /// Expand a whole parsed query against a concept snapshot.
    ///
    /// For a simple query (two or more bare words, implicit conjunctions only) the
    /// words are also looked up as one phrase. When that yields more than one
    /// synonym (more than two if any word is hyphenated) the result becomes
    /// `(word AND word ...) OR (phrase synonyms)`.
    pub fn resolve(&self, parsed: &ParsedQuery, index: &ConceptIndex) -> Option<QueryNode> {
        let root = self.expand(parsed.root.clone()?, index);
        if !parsed.state.is_simple() {
            return Some(root);
        }

        let terms = &parsed.state.terms;
        let threshold = if terms.iter().any(|t| has_internal_hyphen(t)) {
            2
        } else {
            1
        };
        let phrase_synonyms = concept_alternatives(&word_forms(terms), index, Vec::new());
        if phrase_synonyms.len() > threshold {
            Some(QueryNode::or(
                QueryNode::group(root),
                QueryNode::SynonymSet(phrase_synonyms),
            ))
        } else {
            Some(root)
        }
    }

    fn expand(&self, node: QueryNode, index: &ConceptIndex) -> QueryNode {
        match node {
            QueryNode::Term(term) => self.resolve_term(&term, index),
            QueryNode::Phrase(words) => self.resolve_phrase(words, index),
            QueryNode::BinaryOp { op, left, right } => {
                QueryNode::binary(op, self.expand(*left, index), self.expand(*right, index))
            }
            QueryNode::Not(child) => QueryNode::negate(self.expand(*child, index)),
            QueryNode::Group(child) => QueryNode::group(self.expand(*child, index)),
            set @ QueryNode::SynonymSet(_) => set,
        }
    }

    /// Resolve a single word.
    ///
    /// Stop words are returned untouched. A hyphenated word always expands to its
    /// three spellings; concept synonyms are appended after them.
    pub fn resolve_term(&self, term: &str, index: &ConceptIndex) -> QueryNode {
        if self.stop_words.contains(term) {
            return QueryNode::Term(term.to_string());
        }

        let forms = word_forms(&[term.to_string()]);
        let literals = if has_internal_hyphen(term) {
            forms.iter().cloned().map(Alternative::literal).collect()
        } else {
            Vec::new()
        };
        let alternatives = concept_alternatives(&forms, index, literals);
        if alternatives.is_empty() {
            QueryNode::Term(term.to_string())
        } else {
            QueryNode::SynonymSet(alternatives)
        }
    }

    /// Resolve a quoted phrase. Without a concept match the phrase is kept as is.
    pub fn resolve_phrase(&self, words: Vec<String>, index: &ConceptIndex) -> QueryNode {
        let alternatives = concept_alternatives(&word_forms(&words), index, Vec::new());
        if alternatives.is_empty() {
            QueryNode::Phrase(words)
        } else {
            QueryNode::SynonymSet(alternatives)
        }
    }
}

/// Append the synonyms of every concept matching any form, skipping duplicates.
fn concept_alternatives(
    forms: &[Vec<String>],
    index: &ConceptIndex,
    mut alternatives: Vec<Alternative>,
) -> Vec<Alternative> {
    let mut seen_concepts = HashSet::new();
    let mut seen_keys: HashSet<String> = alternatives.iter().map(Alternative::key).collect();

    for form in forms {
        for concept in index.lookup(&lookup_key(form)) {
            if !seen_concepts.insert(concept.id.as_str()) {
                continue;
            }
            for words in concept.normalized_synonyms() {
                let alt = Alternative::concept(words);
                if seen_keys.insert(alt.key()) {
                    alternatives.push(alt);
                }
            }
        }
    }
    alternatives
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn concept(id: &str, synonyms: &[&str]) -> Concept {
        Concept {
            id: id.to_string(),
            description: synonyms.first().copied().unwrap_or_default().to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            codes: Vec::new(),
        }
    }

    #[test]
    fn normalizes_stored_synonyms() {
        let c = concept("C1", &["Lung Cancer", "lung&<->cancer", "pulmonary <-> carcinoma"]);
        assert_eq!(
            c.normalized_synonyms(),
            vec![
                vec!["lung".to_string(), "cancer".to_string()],
                vec!["pulmonary".to_string(), "carcinoma".to_string()],
            ]
        );
    }

    #[test]
    fn hyphen_forms() {
        let forms = word_forms(&["aa-cc".to_string()]);
        let keys: Vec<_> = forms.iter().map(|f| lookup_key(f)).collect();
        assert_eq!(keys, vec!["aa-cc", "aacc", "aa cc"]);
    }

    #[test]
    fn lookup_keys_cover_terms_phrases_and_whole_phrase() {
        let stop = StopWords::english();
        let resolver = SynonymResolver::new(&stop);
        let keys = resolver.lookup_keys(&parse("the lung cancer"));
        assert_eq!(keys, vec!["lung", "cancer", "the lung cancer"]);

        let keys = resolver.lookup_keys(&parse("\"Heart Attack\" OR x-ray"));
        assert_eq!(keys, vec!["heart attack", "x-ray", "xray", "x ray"]);
    }

    #[test]
    fn concepts_are_merged_once_across_forms() {
        let index = ConceptIndex::new(vec![concept("C1", &["e-mail", "email", "electronic mail"])]);
        let stop = StopWords::none();
        let node = SynonymResolver::new(&stop).resolve_term("e-mail", &index);
        let QueryNode::SynonymSet(alts) = node else {
            panic!("expected synonym set");
        };
        let keys: Vec<_> = alts.iter().map(Alternative::key).collect();
        assert_eq!(keys, vec!["e-mail", "email", "e mail", "electronic mail"]);
    }
}

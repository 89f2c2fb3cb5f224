//! Result ordering
//!
//! A [`RankKey`] is an ordered list of sort directives. Parameter handlers push
//! their own keys first (text relevance, classification frequency);
//! [`RankKey::with_default_ordering`] then appends the composite default:
//! current-state priority, published date, recommendation strength, evidence
//! quality, and finally id as a stable tie-break.

use std::collections::HashMap;

use super::predicate::TextField;
use crate::models::ArtifactId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    /// Full-text rank of a compiled query.
    TextRelevance { field: TextField, query: String },
    /// Number of classification lookups each id matched, sorted by id.
    MatchFrequency(Vec<(ArtifactId, u32)>),
    CurrentStatePriority,
    PublishedDate,
    RecommendationStrength,
    EvidenceQuality,
    Id,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortDirective {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortDirective {
    pub fn asc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankKey {
    directives: Vec<SortDirective>,
}

impl RankKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, directive: SortDirective) {
        self.directives.push(directive);
    }

    /// Most relevant first.
    pub fn push_relevance(&mut self, field: TextField, query: impl Into<String>) {
        self.push(SortDirective::desc(SortKey::TextRelevance {
            field,
            query: query.into(),
        }));
    }

    /// Ids matching more lookups first.
    pub fn push_frequency(&mut self, counts: &HashMap<ArtifactId, u32>) {
        let mut counts: Vec<(ArtifactId, u32)> = counts.iter().map(|(id, n)| (*id, *n)).collect();
        counts.sort_unstable();
        self.push(SortDirective::desc(SortKey::MatchFrequency(counts)));
    }

    /// Append the composite default ordering.
    pub fn with_default_ordering(mut self) -> Self {
        self.push(SortDirective::asc(SortKey::CurrentStatePriority));
        self.push(SortDirective::desc(SortKey::PublishedDate));
        self.push(SortDirective::desc(SortKey::RecommendationStrength));
        self.push(SortDirective::desc(SortKey::EvidenceQuality));
        self.push(SortDirective::asc(SortKey::Id));
        self
    }

    pub fn directives(&self) -> &[SortDirective] {
        &self.directives
    }

    /// The first text-relevance directive, used to report scores.
    pub fn relevance(&self) -> Option<(TextField, &str)> {
        self.directives.iter().find_map(|d| match &d.key {
            SortKey::TextRelevance { field, query } => Some((*field, query.as_str())),
            _ => None,
        })
    }
}

//! Composable citation filters
//!
//! A [`FilterPredicate`] only describes which citations match. Rendering to a
//! backend query happens in [`super::sql`]. Column identity is a closed set of
//! enums so user input can never name a column.

use chrono::{DateTime, Utc};

use super::rank::RankKey;
use crate::models::ArtifactId;

/// Plain text columns on the citation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Title,
    CurrentState,
    Publisher,
    ArtifactType,
}

impl Column {
    pub fn sql_name(&self) -> &'static str {
        match self {
            Column::Title => "title",
            Column::CurrentState => "current_state",
            Column::Publisher => "publisher",
            Column::ArtifactType => "artifact_type",
        }
    }
}

/// Timestamp columns on the citation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateColumn {
    LastUpdated,
    ArticleDate,
}

impl DateColumn {
    pub fn sql_name(&self) -> &'static str {
        match self {
            DateColumn::LastUpdated => "last_updated",
            DateColumn::ArticleDate => "article_date",
        }
    }
}

/// Full-text search vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    /// Whole citation document
    Content,
    /// Classifier labels and keywords
    Keywords,
}

impl TextField {
    pub fn sql_name(&self) -> &'static str {
        match self {
            TextField::Content => "content_tsv",
            TextField::Keywords => "keywords_tsv",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    /// Matches every citation.
    All,
    And(Vec<FilterPredicate>),
    Or(Vec<FilterPredicate>),
    DateCompare {
        column: DateColumn,
        op: CompareOp,
        value: DateTime<Utc>,
    },
    /// `missing = true` matches NULL, `false` matches NOT NULL.
    IsNull {
        column: DateColumn,
        missing: bool,
    },
    /// Full-text match against a compiled backend query.
    TextMatch {
        field: TextField,
        query: String,
    },
    /// Case-insensitive prefix match.
    Prefix {
        column: Column,
        value: String,
    },
    /// Case-insensitive substring match.
    Contains {
        column: Column,
        value: String,
    },
    InSet {
        column: Column,
        values: Vec<String>,
        case_insensitive: bool,
    },
    /// Citation id membership; an empty list matches nothing.
    IdIn(Vec<ArtifactId>),
}

impl FilterPredicate {
    /// Conjunction that drops `All` and flattens nested conjunctions.
    pub fn all_of(parts: Vec<FilterPredicate>) -> FilterPredicate {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                FilterPredicate::All => {}
                FilterPredicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => FilterPredicate::All,
            1 => flat.remove(0),
            _ => FilterPredicate::And(flat),
        }
    }

    /// Disjunction; a single part is returned as is.
    pub fn any_of(mut parts: Vec<FilterPredicate>) -> FilterPredicate {
        if parts.iter().any(|p| matches!(p, FilterPredicate::All)) {
            return FilterPredicate::All;
        }
        match parts.len() {
            0 => FilterPredicate::Or(Vec::new()),
            1 => parts.remove(0),
            _ => FilterPredicate::Or(parts),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, FilterPredicate::All)
    }
}

/// A filter plus its ordering, handed to the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct CitationQuery {
    pub filter: FilterPredicate,
    pub rank: RankKey,
}

impl CitationQuery {
    pub fn new(filter: FilterPredicate, rank: RankKey) -> Self {
        Self { filter, rank }
    }
}

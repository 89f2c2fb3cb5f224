//! Citation records as returned by the record store

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Store identifier of a citation.
pub type ArtifactId = i64;

/// A citation row: the stored resource plus the metadata search needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationRow {
    pub id: ArtifactId,

    /// Sub-collection the citation was imported from, if any.
    pub repository: Option<String>,

    /// Full citation resource JSON
    pub resource: JsonValue,

    /// Full-text relevance when the query ranked by relevance.
    pub score: Option<f64>,
}

/// Lifecycle state of a cited artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrentState {
    Active,
    Draft,
    Unknown,
    Archived,
    Retracted,
}

impl CurrentState {
    /// Every known state, in ranking order.
    pub const ALL: [CurrentState; 5] = [
        CurrentState::Active,
        CurrentState::Draft,
        CurrentState::Unknown,
        CurrentState::Archived,
        CurrentState::Retracted,
    ];

    /// Sort position of states not listed in [`CurrentState::ALL`].
    pub const UNRECOGNIZED_PRIORITY: i32 = 5;

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "draft" => Some(Self::Draft),
            "unknown" => Some(Self::Unknown),
            "archived" => Some(Self::Archived),
            "retracted" => Some(Self::Retracted),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Draft => "draft",
            Self::Unknown => "unknown",
            Self::Archived => "archived",
            Self::Retracted => "retracted",
        }
    }

    /// Lower sorts first.
    pub fn priority(&self) -> i32 {
        match self {
            Self::Active => 0,
            Self::Draft => 1,
            Self::Unknown => 2,
            Self::Archived => 3,
            Self::Retracted => 4,
        }
    }
}

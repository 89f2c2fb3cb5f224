//! Search log entries

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

/// A named search parameter recorded for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedParameter {
    pub name: String,
    pub value: String,
}

impl LoggedParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One executed search.
///
/// Created when the search starts and finalized once paging completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLogEntry {
    pub id: Uuid,

    /// Raw request parameters, in request order.
    pub criteria: Vec<(String, String)>,

    /// Logged named parameters only.
    pub entries: Vec<LoggedParameter>,

    /// Rows returned; `None` for count-only searches.
    pub result_count: Option<i64>,

    pub total: i64,

    pub client_address: Option<String>,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,

    /// Matches per originating repository.
    pub repository_counts: BTreeMap<String, i64>,
}

impl SearchLogEntry {
    pub fn start(criteria: Vec<(String, String)>, client_address: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            criteria,
            entries: Vec::new(),
            result_count: None,
            total: 0,
            client_address,
            started_at: Utc::now(),
            finished_at: None,
            repository_counts: BTreeMap::new(),
        }
    }

    pub fn finish(
        &mut self,
        result_count: Option<i64>,
        total: i64,
        repository_counts: BTreeMap<String, i64>,
    ) {
        self.result_count = result_count;
        self.total = total;
        self.repository_counts = repository_counts;
        self.finished_at = Some(Utc::now());
    }

    /// Criteria as a JSON object of name -> list of values.
    pub fn criteria_json(&self) -> JsonValue {
        let mut map: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (name, value) in &self.criteria {
            map.entry(name.as_str()).or_default().push(value.as_str());
        }
        json!(map)
    }
}

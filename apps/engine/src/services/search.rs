//! Search service - citation search implementation
//!
//! Orchestrates a search by:
//! - Resolving paging directives
//! - Building the filter and ordering through [`FilterBuilder`]
//! - Counting and paging through the [`CitationStore`]
//! - Assembling navigation links and the searchset Bundle
//! - Recording the search log entry (best-effort)

use std::collections::BTreeMap;
use std::sync::Arc;

use citeline_query::StopWords;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use super::audit::SearchAuditLogger;
use crate::config::SearchConfig;
use crate::db::search::{CitationQuery, FilterBuilder, Paging, SearchCriteria};
use crate::db::{with_timeout, CitationStore, ConceptStore, MeshTreeStore};
use crate::models::{CitationRow, SearchLogEntry};
use crate::Result;

/// Paging parameter names replaced in navigation links.
const PAGING_PARAMS: [&str; 3] = ["_count", "count", "page"];

/// One incoming search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Request URL as received, used for navigation links.
    pub url: String,
    pub criteria: SearchCriteria,
    pub client_address: Option<String>,
}

impl SearchRequest {
    /// Build from a request URL; criteria come from its query string.
    pub fn from_url(url: impl Into<String>, client_address: Option<String>) -> Self {
        let url = url.into();
        let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
        let query = query.split('#').next().unwrap_or("");
        Self {
            criteria: SearchCriteria::from_query_string(query),
            url,
            client_address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub relation: &'static str,
    pub url: String,
}

/// Result of a search before rendering.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub rows: Vec<CitationRow>,
    pub total: i64,
    pub paging: Paging,
    pub links: Vec<Link>,
    /// Parameter names that were ignored.
    pub ignored: Vec<String>,
    pub log_entry: SearchLogEntry,
}

/// Search service coordinates citation searches
pub struct SearchService {
    citations: Arc<dyn CitationStore>,
    concepts: Arc<dyn ConceptStore>,
    mesh: Arc<dyn MeshTreeStore>,
    audit: SearchAuditLogger,
    stop_words: Arc<StopWords>,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(
        citations: Arc<dyn CitationStore>,
        concepts: Arc<dyn ConceptStore>,
        mesh: Arc<dyn MeshTreeStore>,
        audit: SearchAuditLogger,
        stop_words: Arc<StopWords>,
        config: SearchConfig,
    ) -> Self {
        Self {
            citations,
            concepts,
            mesh,
            audit,
            stop_words,
            config,
        }
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        let mut log_entry =
            SearchLogEntry::start(request.criteria.items().to_vec(), request.client_address.clone());

        let paging = request.criteria.paging(&self.config)?;

        let built = FilterBuilder::new(
            self.citations.as_ref(),
            self.concepts.as_ref(),
            self.mesh.as_ref(),
            &self.stop_words,
            &self.config,
        )
        .build(&request.criteria)
        .await?;
        log_entry.entries = built.log_entries;

        let (rows, total) = self.fetch(&built.query, paging).await.map_err(|e| {
            tracing::error!(error = %e, "Citation search failed");
            e
        })?;

        let breakdown = self.repository_breakdown(&built.query).await;
        let links = build_links(&request.url, paging, total);

        let result_count = match paging {
            Paging::CountOnly => None,
            _ => Some(rows.len() as i64),
        };
        log_entry.finish(result_count, total, breakdown);

        tracing::info!(
            total,
            returned = rows.len(),
            paging = ?paging,
            "Citation search completed"
        );

        self.audit.record(&log_entry).await;

        Ok(SearchOutcome {
            rows,
            total,
            paging,
            links,
            ignored: built.ignored,
            log_entry,
        })
    }

    async fn fetch(&self, query: &CitationQuery, paging: Paging) -> Result<(Vec<CitationRow>, i64)> {
        let timeout = self.config.store_timeout();
        match paging {
            Paging::All => {
                let rows = with_timeout(timeout, "citations.all", self.citations.all(query)).await?;
                let total = rows.len() as i64;
                Ok((rows, total))
            }
            Paging::CountOnly => {
                let total = with_timeout(timeout, "citations.count", self.citations.count(query)).await?;
                Ok((Vec::new(), total))
            }
            Paging::Page { page, size } => {
                with_timeout(timeout, "citations.page", self.citations.page(query, page, size)).await
            }
        }
    }

    /// Matches per repository; an empty breakdown when the store fails.
    async fn repository_breakdown(&self, query: &CitationQuery) -> BTreeMap<String, i64> {
        let call = self.citations.count_by_repository(query);
        match with_timeout(self.config.store_timeout(), "citations.count_by_repository", call).await {
            Ok(counts) => counts,
            Err(e) => {
                tracing::warn!(error = %e, "Repository breakdown unavailable");
                BTreeMap::new()
            }
        }
    }

    /// Render an outcome as a searchset Bundle.
    ///
    /// Order: resourceType, type, total, link, entry
    pub fn to_bundle(&self, outcome: &SearchOutcome) -> JsonValue {
        let base_url = self.config.base_url.trim_end_matches('/');

        let entries: Vec<JsonValue> = outcome
            .rows
            .iter()
            .map(|row| {
                let resource_type = row
                    .resource
                    .get("resourceType")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Citation");
                let id = row
                    .resource
                    .get("id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| row.id.to_string());

                let mut search = json!({ "mode": "match" });
                if let Some(score) = row.score {
                    search["score"] = json!(score);
                }
                json!({
                    "fullUrl": format!("{}/{}/{}", base_url, resource_type, id),
                    "resource": row.resource,
                    "search": search
                })
            })
            .collect();

        let mut bundle = json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": outcome.total,
            "link": outcome.links,
        });
        if outcome.paging != Paging::CountOnly {
            bundle["entry"] = json!(entries);
        }
        bundle
    }
}

/// Navigation links for a result of `total` matches.
///
/// Only `self` unless paginating; then `first` and `last` always, `prev`
/// except on page 1 and `next` except on the last page.
pub fn build_links(request_url: &str, paging: Paging, total: i64) -> Vec<Link> {
    let Paging::Page { page, size } = paging else {
        return vec![Link {
            relation: "self",
            url: request_url.to_string(),
        }];
    };

    let last_page = last_page(total, size);
    let url = |n: i64| page_url(request_url, size, n);

    let mut links = vec![
        Link {
            relation: "self",
            url: url(page),
        },
        Link {
            relation: "first",
            url: url(1),
        },
    ];
    if page > 1 {
        links.push(Link {
            relation: "prev",
            url: url(page - 1),
        });
    }
    if page < last_page {
        links.push(Link {
            relation: "next",
            url: url(page + 1),
        });
    }
    links.push(Link {
        relation: "last",
        url: url(last_page),
    });
    links
}

/// Number of pages; at least 1 so that `first`/`last` always resolve.
pub fn last_page(total: i64, size: i64) -> i64 {
    if size <= 0 || total <= 0 {
        return 1;
    }
    (total + size - 1) / size
}

/// The request URL with paging parameters replaced. Other parameters are
/// kept exactly as sent.
fn page_url(request_url: &str, size: i64, page: i64) -> String {
    let (without_fragment, _) = request_url.split_once('#').unwrap_or((request_url, ""));
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    let mut pairs: Vec<String> = query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| {
            let name = url::form_urlencoded::parse(segment.as_bytes())
                .next()
                .map(|(k, _)| k.into_owned())
                .unwrap_or_default();
            !PAGING_PARAMS.contains(&name.as_str())
        })
        .map(str::to_string)
        .collect();

    let paging = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("_count", &size.to_string())
        .append_pair("page", &page.to_string())
        .finish();
    pairs.push(paging);

    format!("{}?{}", path, pairs.join("&"))
}

//! Search service: paging, links, audit logging and failure handling

mod common;

use std::sync::Arc;
use std::time::Duration;

use citeline::db::search::{Paging, SearchCriteria};
use citeline::services::{SearchAuditLogger, SearchRequest, SearchService};
use citeline::Error;
use citeline_query::StopWords;
use common::*;

fn request(url: &str) -> SearchRequest {
    SearchRequest::from_url(url, Some("192.0.2.10".to_string()))
}

fn three_active() -> Vec<StoredCitation> {
    vec![
        citation(1, "active", &[]),
        citation(2, "active", &[]),
        citation(3, "active", &[]),
    ]
}

#[tokio::test]
async fn paginates_three_results_one_per_page() {
    let harness = Harness::with_citations(three_active());
    let base = "/Citation?artifact-current-state=active&_count=1";

    let first = harness.service.search(&request(&format!("{base}&page=1"))).await.unwrap();
    assert_eq!(first.total, 3);
    assert_eq!(first.rows.len(), 1);
    let relations: Vec<_> = first.links.iter().map(|l| l.relation).collect();
    assert_eq!(relations, vec!["self", "first", "next", "last"]);
    assert!(first.links[0].url.contains("page=1"));
    assert!(first.links[3].url.contains("page=3"));

    let last = harness.service.search(&request(&format!("{base}&page=3"))).await.unwrap();
    let relations: Vec<_> = last.links.iter().map(|l| l.relation).collect();
    assert_eq!(relations, vec!["self", "first", "prev", "last"]);
    assert!(last.links[0].url.contains("page=3"));
    assert_eq!(last.rows[0].id, 3);
}

#[tokio::test]
async fn default_count_returns_everything() {
    let harness = Harness::with_citations(three_active());
    let outcome = harness
        .service
        .search(&request("/Citation?artifact-current-state=active"))
        .await
        .unwrap();
    assert_eq!(outcome.paging, Paging::All);
    assert_eq!(outcome.rows.len(), 3);
    assert_eq!(outcome.links.len(), 1);
    assert_eq!(outcome.links[0].relation, "self");
}

#[tokio::test]
async fn count_only_returns_total_without_rows() {
    let harness = Harness::with_citations(three_active());
    let outcome = harness
        .service
        .search(&request("/Citation?artifact-current-state=active&_count=0"))
        .await
        .unwrap();
    assert_eq!(outcome.total, 3);
    assert!(outcome.rows.is_empty());
    assert_eq!(outcome.log_entry.result_count, None);

    let bundle = harness.service.to_bundle(&outcome);
    assert_eq!(bundle["total"], 3);
    assert!(bundle.get("entry").is_none());
}

#[tokio::test]
async fn bundle_lists_matches() {
    let harness = Harness::with_citations(three_active());
    let outcome = harness
        .service
        .search(&request("/Citation?artifact-current-state=active&_count=2"))
        .await
        .unwrap();
    let bundle = harness.service.to_bundle(&outcome);
    assert_eq!(bundle["resourceType"], "Bundle");
    assert_eq!(bundle["type"], "searchset");
    assert_eq!(bundle["entry"].as_array().unwrap().len(), 2);
    assert_eq!(bundle["entry"][0]["search"]["mode"], "match");
    assert_eq!(
        bundle["entry"][0]["fullUrl"],
        "http://localhost:8080/fhir/Citation/1"
    );
    assert_eq!(bundle["link"][0]["relation"], "self");
}

#[tokio::test]
async fn missing_current_state_is_a_validation_failure() {
    let harness = Harness::with_citations(three_active());
    let err = harness
        .service
        .search(&request("/Citation?_content=asthma"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingParameter(ref name) if name == "artifact-current-state"));
    let outcome = err.to_operation_outcome();
    assert_eq!(outcome["issue"][0]["code"], "required");
    assert!(harness.citations.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_date_names_the_parameter() {
    let harness = Harness::with_citations(three_active());
    let err = harness
        .service
        .search(&request("/Citation?artifact-current-state=active&article-date=gt20x0"))
        .await
        .unwrap_err();
    match err {
        Error::InvalidParameter { name, value, .. } => {
            assert_eq!(name, "article-date");
            assert_eq!(value, "gt20x0");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn search_log_records_named_parameters_only() {
    let harness = Harness::with_citations(three_active());
    harness
        .service
        .search(&request(
            "/Citation?artifact-current-state=active&title=lung&_content=asthma&artifact-type=guideline&_count=2",
        ))
        .await
        .unwrap();

    let entries = harness.audit.entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    let names: Vec<_> = entry.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["title", "content"]);
    assert_eq!(entry.result_count, Some(2));
    assert_eq!(entry.total, 3);
    assert_eq!(entry.client_address.as_deref(), Some("192.0.2.10"));
    assert_eq!(entry.repository_counts.get("pubmed"), Some(&3));
    assert_eq!(entry.criteria.len(), 5);
    assert!(entry.finished_at.is_some());
}

#[tokio::test]
async fn audit_failure_does_not_fail_the_search() {
    let config = test_config();
    let service = SearchService::new(
        Arc::new(FakeCitationStore::new(three_active())),
        Arc::new(FakeConceptStore::default()),
        Arc::new(FakeMeshTreeStore::default()),
        SearchAuditLogger::new(Arc::new(FailingAuditLog), &config.audit),
        Arc::new(StopWords::english()),
        config.search,
    );
    let outcome = service
        .search(&request("/Citation?artifact-current-state=active"))
        .await
        .unwrap();
    assert_eq!(outcome.total, 3);
}

#[tokio::test]
async fn disabled_audit_writes_nothing() {
    let mut config = test_config();
    config.audit.enabled = false;
    let audit = Arc::new(RecordingAuditLog::default());
    let logger = SearchAuditLogger::new(audit.clone(), &config.audit);
    assert!(!logger.is_enabled());
    let service = SearchService::new(
        Arc::new(FakeCitationStore::new(three_active())),
        Arc::new(FakeConceptStore::default()),
        Arc::new(FakeMeshTreeStore::default()),
        logger,
        Arc::new(StopWords::english()),
        config.search,
    );
    service
        .search(&request("/Citation?artifact-current-state=active"))
        .await
        .unwrap();
    assert!(audit.entries.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_store_times_out() {
    let config = test_config();
    let mut store = FakeCitationStore::new(three_active());
    store.delay = Some(Duration::from_millis(config.search.store_timeout_ms * 2));
    let service = SearchService::new(
        Arc::new(store),
        Arc::new(FakeConceptStore::default()),
        Arc::new(FakeMeshTreeStore::default()),
        SearchAuditLogger::disabled(),
        Arc::new(StopWords::english()),
        config.search,
    );
    let err = service
        .search(&request("/Citation?artifact-current-state=active&_count=0"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StoreTimeout("citations.count")));
    assert_eq!(err.issue_code(), "timeout");
}

#[tokio::test]
async fn unknown_parameters_are_reported_and_ignored() {
    let harness = Harness::with_citations(three_active());
    let criteria = SearchCriteria::from_items(vec![
        ("artifact-current-state".into(), "active".into()),
        ("_sort".into(), "title".into()),
    ]);
    let outcome = harness
        .service
        .search(&SearchRequest {
            url: "/Citation".into(),
            criteria,
            client_address: None,
        })
        .await
        .unwrap();
    assert_eq!(outcome.ignored, vec!["_sort".to_string()]);
    assert_eq!(outcome.total, 3);
}

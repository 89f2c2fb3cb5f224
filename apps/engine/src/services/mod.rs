//! Business logic services

pub mod audit;
pub mod search;

pub use audit::SearchAuditLogger;
pub use search::{build_links, Link, SearchOutcome, SearchRequest, SearchService};

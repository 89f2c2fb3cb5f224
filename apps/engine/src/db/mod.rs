//! Database layer - store traits, search building and PostgreSQL stores

pub mod audit;
pub mod citations;
pub mod concepts;
pub mod mesh;
pub mod search;
pub mod traits;

use std::future::Future;
use std::time::Duration;

pub use audit::PgAuditLogStore;
pub use citations::PgCitationStore;
pub use concepts::PgConceptStore;
pub use mesh::PgMeshTreeStore;
pub use traits::{AuditLogStore, CitationStore, ConceptStore, MeshTreeStore};

use crate::{Error, Result};

/// Run a store call with a deadline. Expiry yields `Error::StoreTimeout`.
pub async fn with_timeout<T, F>(limit: Duration, operation: &'static str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(operation, timeout_ms = limit.as_millis() as u64, "Store call timed out");
            Err(Error::StoreTimeout(operation))
        }
    }
}

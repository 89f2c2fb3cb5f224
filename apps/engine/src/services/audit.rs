//! Search audit logging
//!
//! Persisting a search log entry is best-effort: failures and timeouts are
//! reported on the operational log and never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AuditConfig;
use crate::db::{with_timeout, AuditLogStore};
use crate::models::SearchLogEntry;

#[derive(Clone)]
pub struct SearchAuditLogger {
    store: Option<Arc<dyn AuditLogStore>>,
    timeout: Duration,
}

impl SearchAuditLogger {
    pub fn new(store: Arc<dyn AuditLogStore>, config: &AuditConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            store: Some(store),
            timeout: config.timeout(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            store: None,
            timeout: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Persist `entry`. Returns whether it was written.
    pub async fn record(&self, entry: &SearchLogEntry) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        match with_timeout(self.timeout, "audit.append", store.append(entry)).await {
            Ok(()) => {
                tracing::debug!(id = %entry.id, total = entry.total, "Search log entry written");
                true
            }
            Err(e) => {
                tracing::warn!(id = %entry.id, error = %e, "Failed to persist search log entry");
                false
            }
        }
    }
}

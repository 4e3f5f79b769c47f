//! Per-caller usage ledger.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use fswap_models::{CallerKey, JobKind};

use crate::error::RepoResult;

/// Admission counting for the gate's daily quota window.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Record an admission for a caller.
    async fn record(&self, caller: &CallerKey, kind: JobKind, at: DateTime<Utc>) -> RepoResult<()>;

    /// Count admissions by this caller of this kind since `since`.
    async fn count_since(
        &self,
        caller: &CallerKey,
        kind: JobKind,
        since: DateTime<Utc>,
    ) -> RepoResult<u64>;
}

/// In-memory `UsageLedger` for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryUsageLedger {
    entries: Arc<Mutex<Vec<(CallerKey, JobKind, DateTime<Utc>)>>>,
}

impl MemoryUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageLedger for MemoryUsageLedger {
    async fn record(&self, caller: &CallerKey, kind: JobKind, at: DateTime<Utc>) -> RepoResult<()> {
        self.entries.lock().await.push((caller.clone(), kind, at));
        Ok(())
    }

    async fn count_since(
        &self,
        caller: &CallerKey,
        kind: JobKind,
        since: DateTime<Utc>,
    ) -> RepoResult<u64> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|(key, k, at)| key == caller && *k == kind && *at >= since)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_counts_are_scoped_by_caller_kind_and_window() {
        let ledger = MemoryUsageLedger::new();
        let alice = CallerKey::User("alice".into());
        let session = CallerKey::Session("s1".into());
        let now = Utc::now();

        ledger.record(&alice, JobKind::Image, now).await.unwrap();
        ledger.record(&alice, JobKind::Video, now).await.unwrap();
        ledger.record(&session, JobKind::Image, now).await.unwrap();
        ledger
            .record(&alice, JobKind::Image, now - Duration::days(2))
            .await
            .unwrap();

        let since = now - Duration::hours(1);
        assert_eq!(ledger.count_since(&alice, JobKind::Image, since).await.unwrap(), 1);
        assert_eq!(ledger.count_since(&alice, JobKind::Video, since).await.unwrap(), 1);
        assert_eq!(ledger.count_since(&session, JobKind::Image, since).await.unwrap(), 1);
        assert_eq!(ledger.count_since(&session, JobKind::Video, since).await.unwrap(), 0);
    }
}

//! Tiered admission gate.
//!
//! Every submission passes here before any expensive work happens.
//! Checks run in a fixed order so the caller always sees the most
//! actionable rejection first: payload size, then feature entitlement,
//! then the daily quota. Quota counting charges the usage ledger only
//! after the decision, at actual enqueue time.

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use tracing::debug;

use fswap_models::{
    AdmissionDecision, Admitted, CallerIdentity, JobKind, RejectReason, SwapOptions, TierLimits,
    UNLIMITED,
};
use fswap_repo::{RepoResult, UsageLedger};

/// Gate deciding whether a submission is admitted.
#[derive(Clone)]
pub struct AdmissionGate {
    ledger: Arc<dyn UsageLedger>,
}

impl AdmissionGate {
    pub fn new(ledger: Arc<dyn UsageLedger>) -> Self {
        Self { ledger }
    }

    /// Decide admission for one submission.
    ///
    /// `payload_bytes` is the size of the target media; the source
    /// image has its own fixed ceiling checked by the caller.
    pub async fn decide(
        &self,
        caller: &CallerIdentity,
        kind: JobKind,
        payload_bytes: u64,
        options: &SwapOptions,
    ) -> RepoResult<AdmissionDecision> {
        let tier = caller.tier();
        let limits = TierLimits::for_tier(tier);

        let max_bytes = match kind {
            JobKind::Image => limits.max_image_bytes,
            JobKind::Video => limits.max_video_bytes,
        };
        if payload_bytes > max_bytes {
            return Ok(AdmissionDecision::Rejected(RejectReason::PayloadTooLarge {
                max_bytes,
            }));
        }

        if options.enhance && !limits.enhance_allowed {
            return Ok(AdmissionDecision::Rejected(RejectReason::FeatureNotEntitled));
        }

        let limit = match kind {
            JobKind::Image => limits.image_swaps_per_day,
            JobKind::Video => limits.video_swaps_per_day,
        };
        if limit != UNLIMITED {
            // Anonymous callers without a session have no ledger key and
            // pass uncounted; the session middleware closes that gap on
            // the next request.
            if let Some(key) = caller.ledger_key() {
                let used = self
                    .ledger
                    .count_since(&key, kind, window_start(Utc::now()))
                    .await?;
                debug!(tier = %tier, kind = %kind, used, limit, "quota check");
                if used >= limit as u64 {
                    return Ok(AdmissionDecision::Rejected(RejectReason::quota_exceeded(
                        limit,
                    )));
                }
            }
        }

        Ok(AdmissionDecision::Allowed(Admitted {
            priority: tier.priority(),
            max_payload_bytes: max_bytes,
        }))
    }
}

/// Start of the current daily usage window: midnight UTC.
fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fswap_models::Tier;
    use fswap_repo::MemoryUsageLedger;

    fn gate() -> (AdmissionGate, Arc<MemoryUsageLedger>) {
        let ledger = Arc::new(MemoryUsageLedger::new());
        (AdmissionGate::new(Arc::clone(&ledger) as _), ledger)
    }

    fn anon(session: &str) -> CallerIdentity {
        CallerIdentity::Anonymous {
            session: Some(session.to_string()),
        }
    }

    async fn fill_quota(
        ledger: &MemoryUsageLedger,
        caller: &CallerIdentity,
        kind: JobKind,
        n: u64,
    ) {
        let key = caller.ledger_key().unwrap();
        for _ in 0..n {
            ledger.record(&key, kind, Utc::now()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_admits_below_limit_and_rejects_at_limit() {
        let (gate, ledger) = gate();
        let caller = anon("s1");
        let opts = SwapOptions::default();

        fill_quota(&ledger, &caller, JobKind::Image, 4).await;
        let decision = gate.decide(&caller, JobKind::Image, 1024, &opts).await.unwrap();
        assert!(decision.is_allowed());

        fill_quota(&ledger, &caller, JobKind::Image, 1).await;
        let decision = gate.decide(&caller, JobKind::Image, 1024, &opts).await.unwrap();
        assert_eq!(
            decision,
            AdmissionDecision::Rejected(RejectReason::quota_exceeded(5))
        );
    }

    #[tokio::test]
    async fn test_unlimited_tier_never_hits_quota() {
        let (gate, ledger) = gate();
        let caller = CallerIdentity::User {
            id: "u1".to_string(),
            tier: Tier::Premium,
        };
        fill_quota(&ledger, &caller, JobKind::Video, 500).await;

        let decision = gate
            .decide(&caller, JobKind::Video, 1024, &SwapOptions::default())
            .await
            .unwrap();
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn test_size_rejection_wins_over_exhausted_quota() {
        let (gate, ledger) = gate();
        let caller = anon("s1");
        fill_quota(&ledger, &caller, JobKind::Video, 10).await;

        let oversize = 26 * 1024 * 1024;
        let decision = gate
            .decide(&caller, JobKind::Video, oversize, &SwapOptions::default())
            .await
            .unwrap();
        assert_eq!(
            decision,
            AdmissionDecision::Rejected(RejectReason::PayloadTooLarge {
                max_bytes: 25 * 1024 * 1024
            })
        );
    }

    #[tokio::test]
    async fn test_enhancement_is_entitlement_not_quota() {
        let (gate, _ledger) = gate();
        let caller = CallerIdentity::User {
            id: "u1".to_string(),
            tier: Tier::Standard,
        };
        let opts = SwapOptions {
            enhance: true,
            ..Default::default()
        };

        // Quota untouched, still rejected on entitlement alone
        let decision = gate.decide(&caller, JobKind::Image, 1024, &opts).await.unwrap();
        assert_eq!(
            decision,
            AdmissionDecision::Rejected(RejectReason::FeatureNotEntitled)
        );
    }

    #[tokio::test]
    async fn test_sessionless_anonymous_passes_uncounted() {
        let (gate, _ledger) = gate();
        let caller = CallerIdentity::Anonymous { session: None };

        for _ in 0..20 {
            let decision = gate
                .decide(&caller, JobKind::Image, 1024, &SwapOptions::default())
                .await
                .unwrap();
            assert!(decision.is_allowed());
        }
    }

    #[tokio::test]
    async fn test_admitted_terms_carry_tier_priority() {
        let (gate, _) = gate();
        let premium = CallerIdentity::User {
            id: "u1".to_string(),
            tier: Tier::Premium,
        };
        let admitted = gate
            .decide(&premium, JobKind::Video, 1024, &SwapOptions::default())
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(admitted.priority, 0);

        let admitted = gate
            .decide(&anon("s1"), JobKind::Video, 1024, &SwapOptions::default())
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(admitted.priority, 1);
    }
}

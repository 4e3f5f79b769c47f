//! Admission decisions and rejection reasons.

use serde::{Deserialize, Serialize};

/// Seconds a quota-rejected caller should wait before retrying,
/// aligned to the daily usage window.
pub const QUOTA_RETRY_AFTER_SECS: u64 = 86_400;

/// Why a submission was refused at the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "code")]
pub enum RejectReason {
    /// Daily admission count for this caller and kind is exhausted
    QuotaExceeded {
        limit: i64,
        retry_after_secs: u64,
    },
    /// Payload exceeds the caller's tier ceiling
    PayloadTooLarge { max_bytes: u64 },
    /// A requested feature is not entitled on this tier
    FeatureNotEntitled,
}

impl RejectReason {
    pub fn quota_exceeded(limit: i64) -> Self {
        Self::QuotaExceeded {
            limit,
            retry_after_secs: QUOTA_RETRY_AFTER_SECS,
        }
    }

    /// Machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::QuotaExceeded { .. } => "quota-exceeded",
            RejectReason::PayloadTooLarge { .. } => "payload-too-large",
            RejectReason::FeatureNotEntitled => "feature-not-entitled",
        }
    }

    /// Human-readable detail for the caller.
    pub fn detail(&self) -> String {
        match self {
            RejectReason::QuotaExceeded { limit, .. } => {
                format!("Daily swap limit reached ({limit}). Upgrade for unlimited access.")
            }
            RejectReason::PayloadTooLarge { max_bytes } => {
                let mb = max_bytes / (1024 * 1024);
                format!("Payload exceeds {mb} MB limit")
            }
            RejectReason::FeatureNotEntitled => {
                "Face enhancement requires a premium subscription".to_string()
            }
        }
    }
}

/// Successful admission terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admitted {
    /// Scheduling priority assigned to the job (lower = served first)
    pub priority: u8,
    /// Payload ceiling the admitted job was checked against
    pub max_payload_bytes: u64,
}

/// Result of the admission gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum AdmissionDecision {
    Allowed(Admitted),
    Rejected(RejectReason),
}

impl AdmissionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allowed(_))
    }

    /// Convert into the conventional Result shape.
    pub fn into_result(self) -> Result<Admitted, RejectReason> {
        match self {
            AdmissionDecision::Allowed(a) => Ok(a),
            AdmissionDecision::Rejected(r) => Err(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        assert_eq!(RejectReason::quota_exceeded(5).code(), "quota-exceeded");
        assert_eq!(
            RejectReason::PayloadTooLarge { max_bytes: 1024 }.code(),
            "payload-too-large"
        );
        assert_eq!(RejectReason::FeatureNotEntitled.code(), "feature-not-entitled");
    }

    #[test]
    fn test_quota_carries_retry_after() {
        match RejectReason::quota_exceeded(3) {
            RejectReason::QuotaExceeded {
                limit,
                retry_after_secs,
            } => {
                assert_eq!(limit, 3);
                assert_eq!(retry_after_secs, QUOTA_RETRY_AFTER_SECS);
            }
            other => panic!("unexpected reason: {other:?}"),
        }
    }

    #[test]
    fn test_decision_into_result() {
        let allowed = AdmissionDecision::Allowed(Admitted {
            priority: 0,
            max_payload_bytes: 1024,
        });
        assert!(allowed.is_allowed());
        assert!(allowed.into_result().is_ok());

        let rejected = AdmissionDecision::Rejected(RejectReason::FeatureNotEntitled);
        assert!(!rejected.is_allowed());
        assert!(rejected.into_result().is_err());
    }
}

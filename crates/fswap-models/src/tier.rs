//! Caller tiers, per-tier limits and caller identity.

use serde::{Deserialize, Serialize};

/// Sentinel for an unlimited daily count.
pub const UNLIMITED: i64 = -1;

/// Maximum source/target image size for every tier.
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024; // 10 MB

/// Per-tier video size ceilings.
pub const ANON_MAX_VIDEO_BYTES: u64 = 25 * 1024 * 1024; // 25 MB
pub const STANDARD_MAX_VIDEO_BYTES: u64 = 50 * 1024 * 1024; // 50 MB
pub const PREMIUM_MAX_VIDEO_BYTES: u64 = 100 * 1024 * 1024; // 100 MB

/// Caller tier enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Unauthenticated caller identified by a session token
    #[default]
    Anonymous,
    /// Authenticated caller on the standard subscription
    Standard,
    /// Authenticated caller with an active paid subscription
    Premium,
}

impl Tier {
    /// Parse from string (case-insensitive). Unknown values fall back
    /// to the standard tier, matching how user records store it.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "premium" => Tier::Premium,
            "anonymous" => Tier::Anonymous,
            _ => Tier::Standard,
        }
    }

    /// Scheduling priority for this tier (lower = served first).
    pub fn priority(&self) -> u8 {
        match self {
            Tier::Premium => 0,
            Tier::Standard | Tier::Anonymous => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Anonymous => "anonymous",
            Tier::Standard => "standard",
            Tier::Premium => "premium",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Admission limits for a tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierLimits {
    /// Daily image swaps (`UNLIMITED` for no cap)
    pub image_swaps_per_day: i64,
    /// Daily video swaps (`UNLIMITED` for no cap)
    pub video_swaps_per_day: i64,
    /// Max source/target image payload in bytes
    pub max_image_bytes: u64,
    /// Max target video payload in bytes
    pub max_video_bytes: u64,
    /// Whether face enhancement is entitled
    pub enhance_allowed: bool,
}

impl TierLimits {
    /// Create limits for a specific tier.
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Anonymous => Self {
                image_swaps_per_day: 5,
                video_swaps_per_day: 1,
                max_image_bytes: MAX_IMAGE_BYTES,
                max_video_bytes: ANON_MAX_VIDEO_BYTES,
                enhance_allowed: false,
            },
            Tier::Standard => Self {
                image_swaps_per_day: 10,
                video_swaps_per_day: 3,
                max_image_bytes: MAX_IMAGE_BYTES,
                max_video_bytes: STANDARD_MAX_VIDEO_BYTES,
                enhance_allowed: false,
            },
            Tier::Premium => Self {
                image_swaps_per_day: UNLIMITED,
                video_swaps_per_day: UNLIMITED,
                max_image_bytes: MAX_IMAGE_BYTES,
                max_video_bytes: PREMIUM_MAX_VIDEO_BYTES,
                enhance_allowed: true,
            },
        }
    }
}

/// Identity of a submitting caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum CallerIdentity {
    /// Authenticated user
    User { id: String, tier: Tier },
    /// Anonymous caller, tracked by session token when one exists
    Anonymous { session: Option<String> },
}

impl CallerIdentity {
    /// Tier this caller is admitted under.
    pub fn tier(&self) -> Tier {
        match self {
            CallerIdentity::User { tier, .. } => *tier,
            CallerIdentity::Anonymous { .. } => Tier::Anonymous,
        }
    }

    /// Key used to count this caller's admissions in the usage ledger.
    ///
    /// Anonymous callers without a session have no key and cannot be
    /// rate limited; the surrounding system assigns a session on first
    /// contact, so this path is a deliberate fail-open.
    pub fn ledger_key(&self) -> Option<CallerKey> {
        match self {
            CallerIdentity::User { id, .. } => Some(CallerKey::User(id.clone())),
            CallerIdentity::Anonymous { session: Some(s) } => Some(CallerKey::Session(s.clone())),
            CallerIdentity::Anonymous { session: None } => None,
        }
    }
}

/// Ledger key for admission counting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum CallerKey {
    User(String),
    Session(String),
}

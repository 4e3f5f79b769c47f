//! Caller identity resolution.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use fswap_models::Tier;

use crate::error::RepoResult;

/// Resolved user profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub tier: Tier,
}

/// Bearer-token resolution, supplied by the authentication system.
///
/// An unknown or absent token simply means the caller is anonymous;
/// session issuance itself lives outside this backend.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve_token(&self, token: &str) -> RepoResult<Option<UserProfile>>;
}

/// In-memory `UserDirectory` for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserDirectory {
    tokens: Arc<Mutex<HashMap<String, UserProfile>>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a user.
    pub async fn add_token(&self, token: impl Into<String>, id: impl Into<String>, tier: Tier) {
        self.tokens.lock().await.insert(
            token.into(),
            UserProfile {
                id: id.into(),
                tier,
            },
        );
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn resolve_token(&self, token: &str) -> RepoResult<Option<UserProfile>> {
        Ok(self.tokens.lock().await.get(token).cloned())
    }
}

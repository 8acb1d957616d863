//! User store collaborator contract.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

/// A stored user document, keyed by field name.
pub type UserRecord = serde_json::Map<String, serde_json::Value>;

/// Error raised by a user store lookup.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Contract required from the user/session store subsystem.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up the user record owning the given login token.
    /// `Ok(None)` means the token is unknown or expired.
    async fn lookup_by_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError>;
}

/// In-memory user store keyed by login token.
///
/// Backing store for tests and demos; production deployments supply their
/// own `UserStore` against a real session database.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user record under a login token.
    pub fn insert(&self, token: impl Into<String>, record: UserRecord) {
        self.users
            .write()
            .expect("user store lock poisoned")
            .insert(token.into(), record);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn lookup_by_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(users.get(token).cloned())
    }
}

use std::sync::Arc;
use tracing::debug;

use super::token_store::{MemoryTokenStore, StoreError, TokenStore};

pub const DEFAULT_ACCESS_KEY: &str = "accessToken";
pub const DEFAULT_REFRESH_KEY: &str = "refreshToken";

/// Names of the two persisted token entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub access: String,
    pub refresh: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access: DEFAULT_ACCESS_KEY.to_string(),
            refresh: DEFAULT_REFRESH_KEY.to_string(),
        }
    }
}

/// Snapshot of the stored token pair, read at a single point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Owner of the persisted access/refresh token pair.
///
/// All reads and writes of session tokens go through here. Nothing is
/// cached: every call hits the underlying store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
    keys: StorageKeys,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("keys", &self.keys).finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()), StorageKeys::default())
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn tokens(&self) -> Result<SessionTokens, StoreError> {
        Ok(SessionTokens {
            access_token: self.store.get(&self.keys.access)?,
            refresh_token: self.store.get(&self.keys.refresh)?,
        })
    }

    pub fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(&self.keys.access)
    }

    pub fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(&self.keys.refresh)
    }

    pub fn is_signed_in(&self) -> Result<bool, StoreError> {
        Ok(self.access_token()?.is_some())
    }

    /// Starts a new session. A missing refresh token removes any stale one.
    pub fn begin(&self, access_token: &str, refresh_token: Option<&str>) -> Result<(), StoreError> {
        self.store.set(&self.keys.access, access_token)?;
        match refresh_token {
            Some(token) => self.store.set(&self.keys.refresh, token)?,
            None => self.store.remove(&self.keys.refresh)?,
        }
        debug!(has_refresh_token = refresh_token.is_some(), "session started");
        Ok(())
    }

    pub fn replace_access_token(&self, access_token: &str) -> Result<(), StoreError> {
        self.store.set(&self.keys.access, access_token)
    }

    /// Removes both tokens. Both removals are attempted even if one fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        let access = self.store.remove(&self.keys.access);
        let refresh = self.store.remove(&self.keys.refresh);
        debug!("session cleared");
        access.and(refresh)
    }
}

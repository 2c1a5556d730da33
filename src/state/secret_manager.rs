use super::token_store::{StoreError, TokenStore};

pub const DEFAULT_KEYRING_SERVICE: &str = "com.bookshelf.client";

/// Token store backed by the OS keychain / secret service.
///
/// Each storage key maps to its own keyring entry under a shared service
/// name, so the access and refresh tokens can be rotated independently.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(&self.service, key).map_err(|e| StoreError::Keyring(e.to_string()))
    }

    /// Probes the platform store without touching any stored value.
    pub fn is_available(&self) -> bool {
        let Ok(entry) = self.entry("probe") else {
            return false;
        };

        match entry.get_password() {
            Ok(_) => true,
            Err(keyring::Error::NoEntry) => true,
            Err(keyring::Error::BadEncoding(_)) => true,
            Err(keyring::Error::Ambiguous(_)) => true,
            Err(keyring::Error::NoStorageAccess(_)) => false,
            Err(keyring::Error::PlatformFailure(_)) => false,
            Err(_) => false,
        }
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_KEYRING_SERVICE)
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(pwd) => {
                let trimmed = pwd.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e @ keyring::Error::NoStorageAccess(_)) => Err(StoreError::Keyring(e.to_string())),
            Err(e @ keyring::Error::PlatformFailure(_)) => Err(StoreError::Keyring(e.to_string())),
            Err(_) => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return self.remove(key);
        }
        self.entry(key)?
            .set_password(trimmed)
            .map_err(|e| StoreError::Keyring(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::Keyring(e.to_string())),
        }
    }
}

mod secret_manager;
mod session;
mod token_store;

pub use secret_manager::{KeyringTokenStore, DEFAULT_KEYRING_SERVICE};
pub use session::{Session, SessionTokens, StorageKeys, DEFAULT_ACCESS_KEY, DEFAULT_REFRESH_KEY};
pub use token_store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};

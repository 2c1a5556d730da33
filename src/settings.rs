//! Configuration loading: defaults, then an optional TOML file, then
//! `BOOKSHELF__*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::state::{
  FileTokenStore, KeyringTokenStore, MemoryTokenStore, Session, StorageKeys, TokenStore,
  DEFAULT_ACCESS_KEY, DEFAULT_KEYRING_SERVICE, DEFAULT_REFRESH_KEY,
};

pub const DEFAULT_CONFIG_FILE: &str = "bookshelf.toml";
pub const ENV_PREFIX: &str = "BOOKSHELF";

const SESSION_FILE_RELATIVE_PATH: &str = ".bookshelf/session.json";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  pub refresh_path: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
  Memory,
  File,
  Keyring,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
  pub backend: StorageBackend,
  pub path: Option<PathBuf>,
  pub access_key: String,
  pub refresh_key: String,
  pub keyring_service: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
  pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
  pub api: ApiConfig,
  pub storage: StorageConfig,
  pub logging: LoggingConfig,
}

impl AppConfig {
  /// Loads configuration, layering the file at `path` (or `bookshelf.toml`
  /// when absent) and the environment over the defaults.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let file = match path {
      Some(p) => File::from(p).required(true),
      None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let config = Config::builder()
      .add_source(file)
      .add_source(
        Environment::with_prefix(ENV_PREFIX)
          .prefix_separator("__")
          .separator("__")
          .try_parsing(true),
      )
      .build()?;

    config.try_deserialize()
  }

  /// Builds the session over the configured token store.
  pub fn session(&self) -> Session {
    let keys = StorageKeys {
      access: self.storage.access_key.clone(),
      refresh: self.storage.refresh_key.clone(),
    };
    let store: Arc<dyn TokenStore> = match self.storage.backend {
      StorageBackend::Memory => Arc::new(MemoryTokenStore::new()),
      StorageBackend::File => Arc::new(FileTokenStore::new(self.storage.session_file())),
      StorageBackend::Keyring => Arc::new(KeyringTokenStore::new(&self.storage.keyring_service)),
    };
    Session::new(store, keys)
  }
}

impl StorageConfig {
  pub fn session_file(&self) -> PathBuf {
    if let Some(path) = &self.path {
      return path.clone();
    }
    match std::env::var("HOME") {
      Ok(home) if !home.trim().is_empty() => PathBuf::from(home).join(SESSION_FILE_RELATIVE_PATH),
      _ => PathBuf::from(".bookshelf-session.json"),
    }
  }
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://127.0.0.1:8003".to_string(),
      refresh_path: "/auth/refresh".to_string(),
    }
  }
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      backend: StorageBackend::File,
      path: None,
      access_key: DEFAULT_ACCESS_KEY.to_string(),
      refresh_key: DEFAULT_REFRESH_KEY.to_string(),
      keyring_service: DEFAULT_KEYRING_SERVICE.to_string(),
    }
  }
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "warn".to_string(),
    }
  }
}

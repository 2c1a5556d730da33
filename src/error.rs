//! Error types shared by the request client and the API services.

use thiserror::Error;

use crate::state::StoreError;

/// Message used when a failed response carries no usable `detail`.
pub const GENERIC_FAILURE: &str = "Request failed";

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),

  /// The refresh attempt failed, or a 401 arrived with no refresh token.
  /// Stored tokens have already been cleared when this is returned.
  #[error("session expired, sign in again")]
  AuthExpired,

  #[error("{message}")]
  RequestFailed { status: u16, message: String },

  #[error("unexpected response body: {0}")]
  Decode(String),

  #[error("token storage error: {0}")]
  Storage(#[from] StoreError),

  #[error("{0}")]
  Validation(String),

  #[error("invalid request: {0}")]
  InvalidRequest(String),
}

impl ClientError {
  /// Whether the error ended the session. Only `AuthExpired` does.
  pub fn is_session_expired(&self) -> bool {
    matches!(self, ClientError::AuthExpired)
  }

  /// HTTP status for `RequestFailed`, `None` for every other kind.
  pub fn status(&self) -> Option<u16> {
    match self {
      ClientError::RequestFailed { status, .. } => Some(*status),
      _ => None,
    }
  }
}

pub type ClientResult<T> = Result<T, ClientError>;

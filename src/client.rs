use crate::error::{ClientError, ClientResult, GENERIC_FAILURE};
use crate::redact::redact_secrets;
use crate::settings::ApiConfig;
use crate::state::Session;
use crate::types::{RefreshRequest, RefreshResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const JSON_CONTENT_TYPE: &str = "application/json";

/// A caller-supplied request. `url` is absolute or a path under the
/// configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
  pub method: Method,
  pub url: String,
  pub headers: HeaderMap,
  pub body: Option<Value>,
}

impl ApiRequest {
  pub fn new(method: Method, url: impl Into<String>) -> Self {
    Self {
      method,
      url: url.into(),
      headers: HeaderMap::new(),
      body: None,
    }
  }

  pub fn get(url: impl Into<String>) -> Self {
    Self::new(Method::GET, url)
  }

  pub fn post(url: impl Into<String>) -> Self {
    Self::new(Method::POST, url)
  }

  pub fn put(url: impl Into<String>) -> Self {
    Self::new(Method::PUT, url)
  }

  pub fn delete(url: impl Into<String>) -> Self {
    Self::new(Method::DELETE, url)
  }

  pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ClientResult<Self> {
    let value = serde_json::to_value(body)
      .map_err(|e| ClientError::InvalidRequest(format!("body is not serializable: {e}")))?;
    self.body = Some(value);
    Ok(self)
  }

  pub fn header(mut self, name: &str, value: &str) -> ClientResult<Self> {
    let name = HeaderName::from_bytes(name.as_bytes())
      .map_err(|_| ClientError::InvalidRequest(format!("invalid header name: {name}")))?;
    let value = HeaderValue::from_str(value)
      .map_err(|_| ClientError::InvalidRequest(format!("invalid value for header {name}")))?;
    self.headers.insert(name, value);
    Ok(self)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
  /// 204 No Content.
  Empty,
  Json(Value),
  Text(String),
}

impl ApiResponse {
  pub fn is_empty(&self) -> bool {
    matches!(self, ApiResponse::Empty)
  }

  pub fn into_json<T: DeserializeOwned>(self) -> ClientResult<T> {
    match self {
      ApiResponse::Json(value) => {
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
      }
      ApiResponse::Empty => Err(ClientError::Decode(
        "expected a JSON body, got no content".to_string(),
      )),
      ApiResponse::Text(_) => Err(ClientError::Decode(
        "expected a JSON body, got text".to_string(),
      )),
    }
  }
}

fn resolve_url(base_url: &str, target: &str) -> ClientResult<Url> {
  let target = target.trim();
  let raw = if target.starts_with("http://") || target.starts_with("https://") {
    target.to_string()
  } else {
    format!(
      "{}/{}",
      base_url.trim_end_matches('/'),
      target.trim_start_matches('/')
    )
  };
  Url::parse(&raw).map_err(|e| ClientError::InvalidRequest(format!("invalid url {raw}: {e}")))
}

/// Caller headers first, then the fixed `Content-Type` and `Authorization`
/// headers on top. Without a token any caller `Authorization` is dropped.
fn build_headers(extra: &HeaderMap, access_token: Option<&str>) -> ClientResult<HeaderMap> {
  let mut headers = extra.clone();
  headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
  match access_token {
    Some(token) => {
      let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        ClientError::InvalidRequest("stored access token is not a valid header value".to_string())
      })?;
      value.set_sensitive(true);
      headers.insert(AUTHORIZATION, value);
    }
    None => {
      headers.remove(AUTHORIZATION);
    }
  }
  Ok(headers)
}

fn is_json_content(headers: &HeaderMap) -> bool {
  headers
    .get(CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .map(|ct| ct.to_ascii_lowercase().contains(JSON_CONTENT_TYPE))
    .unwrap_or(false)
}

/// Server `detail` message from an error body, or the generic failure text.
fn extract_detail(body: &str) -> String {
  serde_json::from_str::<Value>(body)
    .ok()
    .as_ref()
    .and_then(|json| json.get("detail"))
    .and_then(|v| v.as_str())
    .map(|s| s.trim())
    .filter(|s| !s.is_empty())
    .map(|s| s.to_string())
    .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

async fn read_response(response: reqwest::Response) -> ClientResult<ApiResponse> {
  let status = response.status();
  if status == StatusCode::NO_CONTENT {
    return Ok(ApiResponse::Empty);
  }

  if !status.is_success() {
    // An unreadable error body still yields the status with the generic message.
    let body = match response.text().await {
      Ok(body) => body,
      Err(e) => {
        debug!(status = status.as_u16(), error = %e, "failed to read error response body");
        String::new()
      }
    };
    let message = extract_detail(&body);
    debug!(status = status.as_u16(), message = %message, "request failed");
    return Err(ClientError::RequestFailed {
      status: status.as_u16(),
      message,
    });
  }

  let is_json = is_json_content(response.headers());
  let body = response.text().await?;
  if is_json {
    serde_json::from_str(&body)
      .map(ApiResponse::Json)
      .map_err(|e| ClientError::Decode(e.to_string()))
  } else {
    Ok(ApiResponse::Text(body))
  }
}

/// HTTP client that attaches the session's bearer token and recovers from an
/// expired access token with a single refresh.
///
/// Refreshes are serialized: a request that hits 401 while another request
/// is refreshing waits, then reuses the token the other request obtained.
#[derive(Clone)]
pub struct AuthenticatedClient {
  http: reqwest::Client,
  base_url: String,
  refresh_path: String,
  session: Session,
  refresh_gate: Arc<Mutex<()>>,
}

impl AuthenticatedClient {
  pub fn new(config: &ApiConfig, session: Session) -> ClientResult<Self> {
    Ok(Self {
      http: reqwest::Client::builder().build()?,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      refresh_path: config.refresh_path.clone(),
      session,
      refresh_gate: Arc::new(Mutex::new(())),
    })
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Sends `request` with the stored access token.
  ///
  /// On 401 the session is refreshed once and the request retried once; the
  /// retry's outcome is final. Fails with `AuthExpired` (after clearing the
  /// stored tokens) when no refresh is possible.
  pub async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
    let url = resolve_url(&self.base_url, &request.url)?;
    let sent_with = self.session.access_token()?;

    let response = self.dispatch(&request, &url, sent_with.as_deref()).await?;
    if response.status() != StatusCode::UNAUTHORIZED {
      return read_response(response).await;
    }

    debug!(%url, "access token rejected");
    let access_token = self.recover_session(sent_with.as_deref()).await?;
    let retry = self.dispatch(&request, &url, Some(&access_token)).await?;
    read_response(retry).await
  }

  pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
    self.send(request).await?.into_json()
  }

  /// Sends `request` without a token and without refresh handling, for the
  /// sign-in and sign-up endpoints.
  pub async fn send_anonymous(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
    let url = resolve_url(&self.base_url, &request.url)?;
    let response = self.dispatch(&request, &url, None).await?;
    read_response(response).await
  }

  async fn dispatch(
    &self,
    request: &ApiRequest,
    url: &Url,
    access_token: Option<&str>,
  ) -> ClientResult<reqwest::Response> {
    let headers = build_headers(&request.headers, access_token)?;
    debug!(
      method = %request.method,
      %url,
      authenticated = access_token.is_some(),
      "dispatching request"
    );

    let mut builder = self
      .http
      .request(request.method.clone(), url.clone())
      .headers(headers);
    if let Some(body) = &request.body {
      builder = builder.json(body);
    }
    Ok(builder.send().await?)
  }

  async fn recover_session(&self, sent_with: Option<&str>) -> ClientResult<String> {
    let _gate = self.refresh_gate.lock().await;

    let tokens = self.session.tokens()?;
    if let Some(current) = tokens.access_token.as_deref() {
      if Some(current) != sent_with {
        debug!("access token was refreshed by a concurrent request");
        return Ok(current.to_string());
      }
    }

    let Some(refresh_token) = tokens.refresh_token else {
      warn!("no refresh token stored, ending session");
      self.expire_session();
      return Err(ClientError::AuthExpired);
    };

    match self.refresh_access_token(&refresh_token).await {
      Ok(access_token) => {
        self.session.replace_access_token(&access_token)?;
        info!("access token refreshed");
        Ok(access_token)
      }
      Err(err) => {
        warn!(
          error = %redact_secrets(&err.to_string()),
          "token refresh failed, ending session"
        );
        self.expire_session();
        Err(ClientError::AuthExpired)
      }
    }
  }

  async fn refresh_access_token(&self, refresh_token: &str) -> ClientResult<String> {
    let url = resolve_url(&self.base_url, &self.refresh_path)?;
    let response = self
      .http
      .post(url)
      .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
      .json(&RefreshRequest { refresh_token })
      .send()
      .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
      return Err(ClientError::RequestFailed {
        status: status.as_u16(),
        message: extract_detail(&body),
      });
    }

    let parsed: RefreshResponse =
      serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
    parsed
      .access_token
      .map(|t| t.trim().to_string())
      .filter(|t| !t.is_empty())
      .ok_or_else(|| ClientError::Decode("refresh response has no access_token".to_string()))
  }

  fn expire_session(&self) {
    if let Err(e) = self.session.clear() {
      warn!(error = %e, "failed to clear stored tokens");
    }
  }
}

use crate::client::{ApiRequest, AuthenticatedClient};
use crate::error::ClientResult;
use crate::types::{MessageResponse, SignIn, SignInResponse, SignUp};
use tracing::info;

const SIGNIN_PATH: &str = "/auth/signin";
const SIGNUP_PATH: &str = "/auth/signup";

/// Sign-in, sign-up and sign-out. Sign-in is the only place a session is
/// created.
pub struct Auth<'a> {
  client: &'a AuthenticatedClient,
}

impl AuthenticatedClient {
  pub fn auth(&self) -> Auth<'_> {
    Auth { client: self }
  }
}

impl Auth<'_> {
  pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<SignInResponse> {
    let request = ApiRequest::post(SIGNIN_PATH).json(&SignIn {
      email: email.trim(),
      password,
    })?;
    let tokens: SignInResponse = self.client.send_anonymous(request).await?.into_json()?;

    self
      .client
      .session()
      .begin(&tokens.access_token, tokens.refresh_token.as_deref())?;
    info!("signed in");
    Ok(tokens)
  }

  pub async fn sign_up(&self, sign_up: &SignUp) -> ClientResult<MessageResponse> {
    let request = ApiRequest::post(SIGNUP_PATH).json(sign_up)?;
    let response = self.client.send_anonymous(request).await?;
    if response.is_empty() {
      return Ok(MessageResponse {
        message: "User created".to_string(),
      });
    }
    response.into_json()
  }

  pub fn sign_out(&self) -> ClientResult<()> {
    self.client.session().clear()?;
    info!("signed out");
    Ok(())
  }

  pub fn is_signed_in(&self) -> ClientResult<bool> {
    Ok(self.client.session().is_signed_in()?)
  }
}

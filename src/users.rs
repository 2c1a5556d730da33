use crate::client::{ApiRequest, AuthenticatedClient};
use crate::error::ClientResult;
use crate::types::{ProfileUpdate, User};
use tracing::info;

pub struct Users<'a> {
  client: &'a AuthenticatedClient,
}

impl AuthenticatedClient {
  pub fn users(&self) -> Users<'_> {
    Users { client: self }
  }
}

impl Users<'_> {
  /// Profile of the signed-in user.
  pub async fn me(&self) -> ClientResult<User> {
    self.client.send_json(ApiRequest::get("/users/me")).await
  }

  pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User> {
    let request = ApiRequest::put("/users/update").json(update)?;
    self.client.send_json(request).await
  }

  /// Deletes the signed-in account and ends the local session.
  pub async fn delete_profile(&self) -> ClientResult<()> {
    self.client.send(ApiRequest::delete("/users/delete")).await?;
    self.client.session().clear()?;
    info!("profile deleted, session cleared");
    Ok(())
  }

  /// All users. Librarian only on the server side.
  pub async fn list(&self) -> ClientResult<Vec<User>> {
    self.client.send_json(ApiRequest::get("/users/")).await
  }
}


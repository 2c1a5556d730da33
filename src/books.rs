use crate::client::{ApiRequest, AuthenticatedClient};
use crate::error::ClientResult;
use crate::types::{Book, BookDraft, MessageResponse};

/// Catalog listing/search plus the librarian CRUD endpoints.
pub struct Books<'a> {
  client: &'a AuthenticatedClient,
}

impl AuthenticatedClient {
  pub fn books(&self) -> Books<'_> {
    Books { client: self }
  }
}

fn list_path(search: Option<&str>) -> String {
  match search.map(str::trim).filter(|q| !q.is_empty()) {
    Some(query) => format!("/books/?search={}", urlencoding::encode(query)),
    None => "/books/".to_string(),
  }
}

fn book_path(id: i64) -> String {
  format!("/books/{id}")
}

impl Books<'_> {
  pub async fn list(&self, search: Option<&str>) -> ClientResult<Vec<Book>> {
    self.client.send_json(ApiRequest::get(list_path(search))).await
  }

  pub async fn get(&self, id: i64) -> ClientResult<Book> {
    self.client.send_json(ApiRequest::get(book_path(id))).await
  }

  pub async fn create(&self, draft: &BookDraft) -> ClientResult<Book> {
    let request = ApiRequest::post("/books/").json(draft)?;
    self.client.send_json(request).await
  }

  pub async fn update(&self, id: i64, draft: &BookDraft) -> ClientResult<Book> {
    let request = ApiRequest::put(book_path(id)).json(draft)?;
    self.client.send_json(request).await
  }

  pub async fn delete(&self, id: i64) -> ClientResult<()> {
    self.client.send(ApiRequest::delete(book_path(id))).await?;
    Ok(())
  }

  pub async fn reserve(&self, id: i64) -> ClientResult<MessageResponse> {
    let request = ApiRequest::put(format!("{}/reserve", book_path(id)));
    self.client.send_json(request).await
  }
}

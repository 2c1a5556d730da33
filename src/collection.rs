use crate::client::{ApiRequest, AuthenticatedClient};
use crate::error::{ClientError, ClientResult};
use crate::types::{ProgressUpdate, ReadingStatus, StatusUpdate, UserBook};

const USER_BOOKS_PATH: &str = "/books/user-books";

impl ProgressUpdate {
  /// Validates page numbers and derives the percentage and status.
  ///
  /// With an unknown total (`0`) progress stays at 0 and any page read
  /// counts as finished.
  pub fn compute(current_page: i64, total_pages: i64) -> ClientResult<Self> {
    if total_pages < 0 {
      return Err(ClientError::Validation(
        "Total pages cannot be negative".to_string(),
      ));
    }
    if current_page < 0 {
      return Err(ClientError::Validation(
        "Current page cannot be negative".to_string(),
      ));
    }
    if total_pages > 0 && current_page > total_pages {
      return Err(ClientError::Validation(
        "Current page cannot be greater than total pages".to_string(),
      ));
    }

    let current = u32::try_from(current_page)
      .map_err(|_| ClientError::Validation("Current page is too large".to_string()))?;
    let total = u32::try_from(total_pages)
      .map_err(|_| ClientError::Validation("Total pages is too large".to_string()))?;

    let progress = if total > 0 {
      let percent = (f64::from(current) / f64::from(total) * 100.0).round();
      percent.min(100.0) as u8
    } else {
      0
    };

    let status = if current == 0 {
      ReadingStatus::NotStarted
    } else if current >= total {
      ReadingStatus::Finished
    } else {
      ReadingStatus::Started
    };

    Ok(Self {
      current_page: current,
      total_pages: total,
      progress,
      status,
    })
  }
}

/// The signed-in user's reading collection.
pub struct Collection<'a> {
  client: &'a AuthenticatedClient,
}

impl AuthenticatedClient {
  pub fn collection(&self) -> Collection<'_> {
    Collection { client: self }
  }
}

fn entry_path(book_id: i64) -> String {
  format!("{USER_BOOKS_PATH}/{book_id}")
}

impl Collection<'_> {
  pub async fn list(&self) -> ClientResult<Vec<UserBook>> {
    self.client.send_json(ApiRequest::get(USER_BOOKS_PATH)).await
  }

  pub async fn add(&self, book_id: i64) -> ClientResult<()> {
    self.client.send(ApiRequest::post(entry_path(book_id))).await?;
    Ok(())
  }

  pub async fn remove(&self, book_id: i64) -> ClientResult<()> {
    self.client.send(ApiRequest::delete(entry_path(book_id))).await?;
    Ok(())
  }

  pub async fn set_status(&self, book_id: i64, status: ReadingStatus) -> ClientResult<()> {
    let request = ApiRequest::put(entry_path(book_id)).json(&StatusUpdate { status })?;
    self.client.send(request).await?;
    Ok(())
  }

  /// Validates locally before sending; nothing goes out on bad input.
  pub async fn set_progress(
    &self,
    book_id: i64,
    current_page: i64,
    total_pages: i64,
  ) -> ClientResult<ProgressUpdate> {
    let update = ProgressUpdate::compute(current_page, total_pages)?;
    let request = ApiRequest::put(entry_path(book_id)).json(&update)?;
    self.client.send(request).await?;
    Ok(update)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn validation_message(result: ClientResult<ProgressUpdate>) -> String {
    match result {
      Err(ClientError::Validation(msg)) => msg,
      other => panic!("expected validation error, got {other:?}"),
    }
  }

  #[test]
  fn progress_rejects_negative_and_overflowing_pages() {
    assert_eq!(
      validation_message(ProgressUpdate::compute(10, -1)),
      "Total pages cannot be negative"
    );
    assert_eq!(
      validation_message(ProgressUpdate::compute(-1, 100)),
      "Current page cannot be negative"
    );
    assert_eq!(
      validation_message(ProgressUpdate::compute(101, 100)),
      "Current page cannot be greater than total pages"
    );
  }

  #[test]
  fn progress_rejects_page_counts_beyond_u32() {
    let beyond = i64::from(u32::MAX) + 1;
    assert_eq!(
      validation_message(ProgressUpdate::compute(beyond, 0)),
      "Current page is too large"
    );
    assert_eq!(
      validation_message(ProgressUpdate::compute(0, beyond)),
      "Total pages is too large"
    );
    let max = i64::from(u32::MAX);
    let update = ProgressUpdate::compute(max, max).unwrap();
    assert_eq!(update.progress, 100);
    assert_eq!(update.status, ReadingStatus::Finished);
  }

  #[test]
  fn progress_is_rounded_percentage() {
    let update = ProgressUpdate::compute(1, 3).unwrap();
    assert_eq!(update.progress, 33);
    assert_eq!(update.status, ReadingStatus::Started);

    let update = ProgressUpdate::compute(2, 3).unwrap();
    assert_eq!(update.progress, 67);
  }

  #[test]
  fn zero_pages_read_is_not_started() {
    let update = ProgressUpdate::compute(0, 250).unwrap();
    assert_eq!(update.progress, 0);
    assert_eq!(update.status, ReadingStatus::NotStarted);
  }

  #[test]
  fn last_page_finishes_the_book() {
    let update = ProgressUpdate::compute(250, 250).unwrap();
    assert_eq!(update.progress, 100);
    assert_eq!(update.status, ReadingStatus::Finished);
  }

  #[test]
  fn unknown_total_counts_any_page_as_finished() {
    let update = ProgressUpdate::compute(12, 0).unwrap();
    assert_eq!(update.progress, 0);
    assert_eq!(update.status, ReadingStatus::Finished);
  }
}

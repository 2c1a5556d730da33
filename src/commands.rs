use crate::app::{BookArgs, BooksCommand, Command, ProfileCommand, ShelfCommand, UsersCommand};
use crate::client::AuthenticatedClient;
use crate::settings::{AppConfig, StorageBackend};
use crate::types::{BookDraft, ProfileUpdate, SignUp};
use anyhow::Context;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

type Output = anyhow::Result<Option<String>>;

fn render<T: Serialize>(value: &T) -> Output {
  Ok(Some(serde_json::to_string_pretty(value)?))
}

fn draft(args: BookArgs) -> BookDraft {
  let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
  BookDraft {
    title: args.title.trim().to_string(),
    author: args.author.trim().to_string(),
    year: args.year,
    isbn: non_empty(args.isbn),
    description: non_empty(args.description),
  }
}

pub(crate) async fn execute(config: &AppConfig, command: Command) -> Output {
  let client = AuthenticatedClient::new(&config.api, config.session())
    .context("failed to build HTTP client")?;

  match command {
    Command::Signin { email, password } => {
      if config.storage.backend == StorageBackend::Memory {
        warn!("memory token storage does not persist between runs");
      }
      client.auth().sign_in(&email, &password).await?;
      render(&json!({ "signed_in": true, "email": email.trim() }))
    }
    Command::Signup {
      name,
      email,
      password,
      role,
    } => {
      let sign_up = SignUp {
        name,
        email,
        password,
        role,
      };
      render(&client.auth().sign_up(&sign_up).await?)
    }
    Command::Signout => {
      client.auth().sign_out()?;
      render(&json!({ "signed_in": false }))
    }
    Command::Books { command } => books(&client, command).await,
    Command::Profile { command } => profile(&client, command).await,
    Command::Users {
      command: UsersCommand::List,
    } => render(&client.users().list().await?),
    Command::Shelf { command } => shelf(&client, command).await,
  }
}

async fn books(client: &AuthenticatedClient, command: BooksCommand) -> Output {
  let books = client.books();
  match command {
    BooksCommand::List { search } => render(&books.list(search.as_deref()).await?),
    BooksCommand::Show { id } => render(&books.get(id).await?),
    BooksCommand::Add(args) => render(&books.create(&draft(args)).await?),
    BooksCommand::Edit { id, book } => render(&books.update(id, &draft(book)).await?),
    BooksCommand::Delete { id } => {
      books.delete(id).await?;
      render(&json!({ "deleted": id }))
    }
    BooksCommand::Reserve { id } => render(&books.reserve(id).await?),
  }
}

async fn profile(client: &AuthenticatedClient, command: ProfileCommand) -> Output {
  let users = client.users();
  match command {
    ProfileCommand::Show => render(&users.me().await?),
    ProfileCommand::Update {
      name,
      email,
      password,
    } => {
      let update = ProfileUpdate {
        name,
        email,
        password,
      };
      render(&users.update_profile(&update).await?)
    }
    ProfileCommand::Delete => {
      users.delete_profile().await?;
      render(&json!({ "deleted": true }))
    }
  }
}

async fn shelf(client: &AuthenticatedClient, command: ShelfCommand) -> Output {
  let collection = client.collection();
  match command {
    ShelfCommand::List => render(&collection.list().await?),
    ShelfCommand::Add { book_id } => {
      collection.add(book_id).await?;
      render(&json!({ "added": book_id }))
    }
    ShelfCommand::Remove { book_id } => {
      collection.remove(book_id).await?;
      render(&json!({ "removed": book_id }))
    }
    ShelfCommand::Status { book_id, status } => {
      collection.set_status(book_id, status).await?;
      render(&json!({ "book_id": book_id, "status": status }))
    }
    ShelfCommand::Progress {
      book_id,
      page,
      total,
    } => {
      let update = collection.set_progress(book_id, page, total).await?;
      render(&json!({ "book_id": book_id, "progress": update }))
    }
  }
}

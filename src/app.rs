use crate::commands;
use crate::error::ClientError;
use crate::logging;
use crate::redact::redact_secrets;
use crate::settings::AppConfig;
use crate::types::{ReadingStatus, Role};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_FAILURE: u8 = 1;
const EXIT_SESSION_EXPIRED: u8 = 2;

#[derive(Parser)]
#[command(name = "bookshelf", version, about = "Library catalog and reading-collection client")]
pub(crate) struct Cli {
  /// Config file path (defaults to ./bookshelf.toml when present)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Override the API base URL
  #[arg(long, global = true)]
  base_url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
  /// Sign in and store the session tokens
  Signin {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
  },
  /// Create an account
  Signup {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long, default_value = "user")]
    role: Role,
  },
  /// Forget the stored session
  Signout,
  /// Browse and manage the catalog
  Books {
    #[command(subcommand)]
    command: BooksCommand,
  },
  /// Show, edit or delete your profile
  Profile {
    #[command(subcommand)]
    command: ProfileCommand,
  },
  /// List users (librarians)
  Users {
    #[command(subcommand)]
    command: UsersCommand,
  },
  /// Your reading collection
  Shelf {
    #[command(subcommand)]
    command: ShelfCommand,
  },
}

#[derive(Args)]
pub(crate) struct BookArgs {
  #[arg(long)]
  pub title: String,
  #[arg(long)]
  pub author: String,
  #[arg(long)]
  pub year: i32,
  #[arg(long)]
  pub isbn: Option<String>,
  #[arg(long)]
  pub description: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum BooksCommand {
  List {
    #[arg(long)]
    search: Option<String>,
  },
  Show {
    id: i64,
  },
  Add(BookArgs),
  Edit {
    id: i64,
    #[command(flatten)]
    book: BookArgs,
  },
  Delete {
    id: i64,
  },
  Reserve {
    id: i64,
  },
}

#[derive(Subcommand)]
pub(crate) enum ProfileCommand {
  Show,
  Update {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    /// Leave empty to keep the current password
    #[arg(long, default_value = "")]
    password: String,
  },
  Delete,
}

#[derive(Subcommand)]
pub(crate) enum UsersCommand {
  List,
}

#[derive(Subcommand)]
pub(crate) enum ShelfCommand {
  List,
  Add {
    book_id: i64,
  },
  Remove {
    book_id: i64,
  },
  Status {
    book_id: i64,
    /// "Not started", "Started" or "Finished"
    status: ReadingStatus,
  },
  Progress {
    book_id: i64,
    #[arg(long, allow_negative_numbers = true)]
    page: i64,
    #[arg(long, allow_negative_numbers = true)]
    total: i64,
  },
}

fn report(err: &anyhow::Error) -> ExitCode {
  if let Some(ClientError::AuthExpired) = err.downcast_ref::<ClientError>() {
    eprintln!("Session expired. Run `bookshelf signin` again.");
    return ExitCode::from(EXIT_SESSION_EXPIRED);
  }
  eprintln!("error: {}", redact_secrets(&format!("{err:#}")));
  ExitCode::from(EXIT_FAILURE)
}

pub fn run() -> ExitCode {
  let cli = Cli::parse();
  dotenvy::dotenv().ok();

  let mut config = match AppConfig::load(cli.config.as_deref()) {
    Ok(config) => config,
    Err(e) => {
      eprintln!("error: failed to load configuration: {e}");
      return ExitCode::from(EXIT_FAILURE);
    }
  };
  if let Some(base_url) = cli.base_url {
    config.api.base_url = base_url;
  }

  logging::init(&config.logging.level);
  tracing::debug!(base_url = %config.api.base_url, "configuration loaded");

  let runtime = match tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()
  {
    Ok(rt) => rt,
    Err(e) => {
      eprintln!("error: failed to start async runtime: {e}");
      return ExitCode::from(EXIT_FAILURE);
    }
  };

  match runtime.block_on(commands::execute(&config, cli.command)) {
    Ok(Some(output)) => {
      println!("{output}");
      ExitCode::SUCCESS
    }
    Ok(None) => ExitCode::SUCCESS,
    Err(err) => report(&err),
  }
}

//! Client for the library management API: catalog browsing and editing,
//! user profiles and the personal reading collection, over bearer-token
//! sessions that refresh themselves once when the access token expires.

mod app;
pub mod auth;
pub mod books;
pub mod client;
pub mod collection;
mod commands;
pub mod error;
pub mod logging;
pub mod redact;
pub mod settings;
pub mod state;
pub mod types;
pub mod users;

pub use client::{ApiRequest, ApiResponse, AuthenticatedClient};
pub use error::{ClientError, ClientResult};
pub use settings::AppConfig;
pub use state::Session;

pub fn run() -> std::process::ExitCode {
    app::run()
}

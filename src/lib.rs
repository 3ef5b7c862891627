//! Polaroid CLI Library
//!
//! This library signs a user in to Spotify with the OAuth 2.0 PKCE flow,
//! keeps the resulting tokens fresh and fetches the listening statistics
//! (profile, top tracks, top artists, playlists, recently played) that make up
//! a Polaroid-style snapshot of someone's music taste.
//!
//! # Modules
//!
//! - `api` - HTTP handlers of the local site (entry, login, callback, home)
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by all layers
//! - `management` - Token storage and the authentication session
//! - `routes` - Route table and the guard for protected views
//! - `server` - Local HTTP server for the OAuth callback and the site
//! - `spotify` - Spotify accounts service and Web API client
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE and time helpers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use polaroidcli::{config, management::AuthSession, spotify::SpotifyClient};
//!
//! #[tokio::main]
//! async fn main() -> polaroidcli::Res<()> {
//!     config::load_env().await?;
//!     let session = Arc::new(AuthSession::load(config::SpotifyConfig::from_env()?).await?);
//!     let client = SpotifyClient::new(session);
//!     println!("{}", client.profile().await?.name());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod routes;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Result alias for the binary and server glue, where errors of different
/// layers meet. Library operations return [`error::Result`] instead.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints a status line prefixed with a blue `o`.
///
/// ```
/// info!("Opening {} in your browser", url);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a line prefixed with a green checkmark once something completed.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red error line and exits with status 1.
///
/// Only for the CLI layer: library code returns errors instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a yellow warning line for recoverable problems.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

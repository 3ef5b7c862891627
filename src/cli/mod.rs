//! # CLI Module
//!
//! User-facing commands of `polaroidcli`. Each command opens the
//! authentication session on the shared storage file, delegates to the
//! session or the Spotify client and renders the result as colored status
//! lines or tables.
//!
//! ## Command Categories
//!
//! ### Authentication
//!
//! - [`auth`] - runs the PKCE login through the browser and the local callback server
//! - [`logout`] - clears every stored token
//! - [`status`] - shows the session state and token expiry
//!
//! ### Listening Statistics
//!
//! - [`profile`] - account name, email, country, plan and followers
//! - [`top_tracks`] / [`top_artists`] - top items for a time range
//! - [`playlists`] - the user's playlists
//! - [`recent`] - recently played tracks
//!
//! ### Local Site
//!
//! - [`serve`] - serves the entry page, login, callback and home view, picking
//!   up logins and logouts made by other `polaroidcli` processes
//!
//! ## Error Handling
//!
//! Authentication failures end with a hint to run `polaroidcli auth`; other
//! failures print the Spotify status and message. Both exit with status 1.
//!
//! ## Usage Patterns
//!
//! ```bash
//! polaroidcli auth                              # Sign in with Spotify
//! polaroidcli top tracks --range short_term     # Past month
//! polaroidcli top artists --limit 5             # Past 6 months, top 5
//! polaroidcli serve                             # Browse http://127.0.0.1:8888
//! ```

mod auth;
mod serve;
mod stats;

use std::{sync::Arc, time::Duration};

use crate::{
    config::SpotifyConfig,
    error,
    management::{AuthSession, FileStorage},
};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub use auth::auth;
pub use auth::logout;
pub use auth::status;
pub use serve::serve;
pub use stats::playlists;
pub use stats::profile;
pub use stats::recent;
pub use stats::top_artists;
pub use stats::top_tracks;

fn spotify_config() -> SpotifyConfig {
    match SpotifyConfig::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    }
}

async fn open_session() -> Arc<AuthSession> {
    match AuthSession::load(spotify_config()).await {
        Ok(session) => Arc::new(session),
        Err(e) => error!("Cannot open session storage. Err: {}", e),
    }
}

/// Opens a session that picks up token changes made by other processes.
async fn open_synced_session() -> Arc<AuthSession> {
    let config = spotify_config();
    let path = FileStorage::default_path();
    match AuthSession::open_synced(config, path, POLL_INTERVAL).await {
        Ok(session) => session,
        Err(e) => error!("Cannot open session storage. Err: {}", e),
    }
}

//! # Spotify Integration Module
//!
//! Everything that talks to Spotify lives here: the accounts service for the
//! OAuth 2.0 PKCE flow and the Web API for the listening statistics.
//!
//! ## Architecture
//!
//! ```text
//! CLI / local server
//!          ↓
//! AuthSession (management)   ← state machine, token gate
//!          ↓
//! Spotify Integration Layer
//!     ├── auth   (login URL, code exchange, refresh)
//!     ├── client (bearer requests, error classification, retries)
//!     ├── top    (top tracks, top artists)
//!     └── user   (profile, playlists, recently played)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Authentication
//!
//! [`auth::OAuthClient`] never keeps tokens itself. The login URL it builds
//! carries an S256 code challenge whose verifier is written to the token
//! store; the code exchange reads it back and removes it once the exchange
//! succeeded. Refresh keeps the old refresh token unless Spotify rotates it.
//!
//! ## Error Classification
//!
//! | Response        | Result                                  | Session        |
//! |-----------------|-----------------------------------------|----------------|
//! | 2xx             | parsed payload                          | unchanged      |
//! | 401 / 403       | `ClientError::Unauthorized`             | logged out     |
//! | 429, 502        | retried, then `RemoteRequestFailed`     | unchanged      |
//! | other non-2xx   | `ClientError::RemoteRequestFailed`      | unchanged      |
//!
//! ## API Coverage
//!
//! - `POST /api/token` - code exchange and refresh
//! - `GET /me` - profile
//! - `GET /me/top/tracks`, `GET /me/top/artists` - top items per time range
//! - `GET /me/playlists` - playlists
//! - `GET /me/player/recently-played` - play history

pub mod auth;
mod client;
mod top;
mod user;

pub use client::DEFAULT_LIMIT;
pub use client::MAX_LIMIT;
pub use client::SpotifyClient;

//! # API Module
//!
//! HTTP handlers of the local site that stands in for the browser app: the
//! entry page, the login redirect, the OAuth callback, the protected home
//! view, logout and a health check.
//!
//! ## Endpoints
//!
//! - [`entry`] - `/`, login link or link to the home view
//! - [`login`] - `/login`, starts a PKCE login and redirects to Spotify
//! - [`callback`] - `/callback`, exchanges the code and redirects to `/home`
//!   or back to `/`
//! - [`home`] - `/home`, guarded; profile plus top tracks and artists for an
//!   optional `?range=`
//! - [`logout`] - `/logout`, clears the session
//! - [`health`] - `/health`, status, version and session state
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! let app = polaroidcli::server::router(state);
//! axum::serve(listener, app).await?;
//! ```

mod callback;
mod health;
mod pages;

pub use callback::callback;
pub use callback::resolve_callback;
pub use health::health;
pub use pages::entry;
pub use pages::home;
pub use pages::login;
pub use pages::logout;

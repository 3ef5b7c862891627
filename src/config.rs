//! Configuration management for the Polaroid CLI.
//!
//! Configuration values come from environment variables, optionally seeded by
//! a `.env` file in the local data directory. Everything except the Spotify
//! client id has a default that points at the public Spotify endpoints.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults

use std::{env, path::PathBuf};

use crate::{error::ClientError, utils};

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";

const CLIENT_ID_MISSING: &str = "SPOTIFY_API_AUTH_CLIENT_ID must be set";

/// Scopes needed for the profile, top items, playlists and recently played.
pub const DEFAULT_SCOPES: [&str; 7] = [
    "user-read-private",
    "user-read-email",
    "playlist-read-private",
    "user-top-read",
    "user-library-read",
    "user-follow-read",
    "user-read-recently-played",
];

/// Returns the directory holding `.env`, the storage file and other state.
///
/// - Linux: `~/.local/share/polaroidcli`
/// - macOS: `~/Library/Application Support/polaroidcli`
/// - Windows: `%LOCALAPPDATA%/polaroidcli`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("polaroidcli");
    path
}

/// Loads environment variables from `<data_dir>/.env`.
///
/// Creates the data directory if needed. A missing `.env` file is fine since
/// the variables may come from the process environment instead; a file that
/// exists but cannot be parsed is an error.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Resolved Spotify and local server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub redirect_uri: String,
    /// Space separated list of scopes.
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub server_address: String,
    pub verifier_length: usize,
}

impl SpotifyConfig {
    /// Creates a config with the default endpoints for the given client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: DEFAULT_SCOPES.join(" "),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            verifier_length: utils::DEFAULT_VERIFIER_LENGTH,
        }
    }

    /// Builds the config from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when `SPOTIFY_API_AUTH_CLIENT_ID` is
    /// missing or empty, or when `PKCE_VERIFIER_LENGTH` is not a number in
    /// 43..=128.
    pub fn from_env() -> Result<Self, ClientError> {
        let client_id = env::var("SPOTIFY_API_AUTH_CLIENT_ID")
            .ok()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ClientError::Config(CLIENT_ID_MISSING.into()))?;

        let mut config = Self::new(client_id);
        config.redirect_uri = var_or("SPOTIFY_API_REDIRECT_URI", config.redirect_uri);
        config.scope = var_or("SPOTIFY_API_AUTH_SCOPE", config.scope);
        config.auth_url = var_or("SPOTIFY_API_AUTH_URL", config.auth_url);
        config.token_url = var_or("SPOTIFY_API_TOKEN_URL", config.token_url);
        config.api_url = var_or("SPOTIFY_API_URL", config.api_url);
        config.server_address = var_or("SERVER_ADDRESS", config.server_address);

        if let Ok(raw) = env::var("PKCE_VERIFIER_LENGTH") {
            config.verifier_length = parse_verifier_length(&raw)?;
        }

        Ok(config)
    }

    /// Returns the API base url without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

fn parse_verifier_length(raw: &str) -> Result<usize, ClientError> {
    match raw.trim().parse::<usize>() {
        Ok(length) if utils::check_verifier_length(length).is_ok() => Ok(length),
        _ => {
            let message = format!("PKCE_VERIFIER_LENGTH '{raw}' is not in 43..=128");
            Err(ClientError::Config(message))
        }
    }
}

fn var_or(key: &str, default: String) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default)
}

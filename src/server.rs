use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};

use crate::{Res, api, management::AuthSession, routes::Route, spotify::SpotifyClient};

/// Shared state of the local site.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<AuthSession>,
    pub client: SpotifyClient,
}

impl AppState {
    pub fn new(session: Arc<AuthSession>) -> Self {
        let client = SpotifyClient::new(Arc::clone(&session));
        Self { session, client }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(Route::Entry.path(), get(api::entry))
        .route(Route::Login.path(), get(api::login))
        .route(Route::Callback.path(), get(api::callback))
        .route(Route::Home.path(), get(api::home))
        .route(Route::Logout.path(), get(api::logout))
        .route(Route::Health.path(), get(api::health))
        .layer(Extension(state))
}

/// Serves the local site on the configured address until the task ends.
pub async fn start_api_server(state: AppState) -> Res<()> {
    let addr = SocketAddr::from_str(&state.session.config().server_address)
        .map_err(|e| format!("Failed to parse server address: {e}"))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

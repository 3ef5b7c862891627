use std::{sync::Arc, time::Duration};

use crate::{
    cli::{open_session, open_synced_session},
    error, info,
    management::{AuthSession, SessionState},
    server::{AppState, start_api_server},
    success, utils, warning,
};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Signs the user in with the OAuth 2.0 PKCE flow.
///
/// Starts the local callback server, opens the Spotify authorization page in
/// the default browser and waits until the callback either stores a token or
/// fails. When another `polaroidcli serve` already owns the callback address,
/// that process stores the token and this one picks it up from storage. Gives
/// up after two minutes.
pub async fn auth() {
    let session = open_synced_session().await;
    if session.is_authenticated() {
        info!("Already logged in. Run polaroidcli logout to switch accounts.");
        return;
    }

    let server_state = AppState::new(Arc::clone(&session));
    let server = tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state).await {
            warning!("Callback server stopped: {}", e);
            info!("Waiting for a running polaroidcli serve to complete the login.");
        }
    });

    let auth_url = match session.login().await {
        Ok(url) => url,
        Err(e) => error!("Cannot start login. Err: {}", e),
    };

    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let outcome = wait_for_login(&session).await;
    server.abort();

    match outcome {
        Some(SessionState::Authenticated) => success!("Authentication successful!"),
        Some(_) => error!("Authentication failed."),
        None => error!("Authentication timed out."),
    }
}

/// Waits until the session leaves `Authenticating`.
async fn wait_for_login(session: &AuthSession) -> Option<SessionState> {
    let mut states = session.subscribe();
    let settled = tokio::time::timeout(
        LOGIN_TIMEOUT,
        states.wait_for(|state| {
            matches!(
                state,
                SessionState::Authenticated | SessionState::Unauthenticated
            )
        }),
    )
    .await;

    match settled {
        Ok(Ok(state)) => Some(*state),
        _ => None,
    }
}

pub async fn logout() {
    let session = open_session().await;
    match session.logout().await {
        Ok(()) => success!("All stored tokens removed."),
        Err(e) => error!("Failed to remove stored tokens. Err: {}", e),
    }
}

pub async fn status() {
    let session = open_session().await;
    info!("Session: {}", session.state());

    if let Some(record) = session.token_record().await {
        info!(
            "Access token expires {}",
            utils::format_expiry(record.expires_at)
        );
        if record.refresh_token.is_none() {
            warning!("No refresh token stored, you will need to log in again once it expires.");
        }
    }
}

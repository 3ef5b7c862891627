use crate::{
    cli::open_synced_session,
    error, info,
    server::{AppState, start_api_server},
};

/// Runs the local site until interrupted.
///
/// The storage file is polled so that `polaroidcli logout` or `auth` in
/// another terminal shows up in the running session.
pub async fn serve() {
    let session = open_synced_session().await;
    let address = session.config().server_address.clone();

    info!("Session: {}", session.state());
    info!("Serving on http://{}", address);
    if let Err(e) = start_api_server(AppState::new(session)).await {
        error!("Server stopped. Err: {}", e);
    }
}

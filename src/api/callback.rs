use std::collections::HashMap;

use axum::{Extension, extract::Query, response::Redirect};

use crate::{management::AuthSession, routes::Route, server::AppState, warning};

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(state): Extension<AppState>,
) -> Redirect {
    let target = resolve_callback(&state.session, &params).await;
    Redirect::to(target.path())
}

/// Finishes the login for the callback query and picks the next route.
///
/// A callback without a `code` (including a denied consent, which arrives
/// as `error=...`) clears the session and leads back to the entry page.
pub async fn resolve_callback(session: &AuthSession, params: &HashMap<String, String>) -> Route {
    let code = params
        .get("code")
        .map(|code| code.trim())
        .filter(|code| !code.is_empty());

    let Some(code) = code else {
        match params.get("error") {
            Some(reason) => warning!("Spotify did not authorize the login: {}", reason),
            None => warning!("Callback did not contain an authorization code."),
        }
        if let Err(e) = session.fail_login().await {
            warning!("Failed to clear stored tokens: {}", e);
        }
        return Route::Entry;
    };

    match session.complete_login(code).await {
        Ok(_) => Route::Home,
        Err(_) => Route::Entry,
    }
}

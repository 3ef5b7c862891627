use std::collections::HashMap;

use axum::{
    Extension,
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
    error::ClientError,
    routes::{self, GuardDecision, Route},
    server::AppState,
    types::{Artist, TimeRange, Track, UserProfile},
    warning,
};

const HOME_LIMIT: u32 = 10;
const INTRO: &str = "Turn your top tracks and artists into a snapshot of your music taste.";

pub async fn entry(Extension(state): Extension<AppState>) -> Html<String> {
    if let Err(e) = state.session.reconcile().await {
        warning!("Failed to read session: {}", e);
    }

    let (target, label) = if state.session.is_authenticated() {
        (Route::Home, "Show my polaroid")
    } else {
        (Route::Login, "Login with Spotify")
    };
    let action = format!(r#"<a href="{}">{label}</a>"#, target.path());

    let body = format!("<p>{INTRO}</p><p>{action}</p>");
    Html(page("Polaroid Me", &body))
}

pub async fn login(Extension(state): Extension<AppState>) -> Response {
    match state.session.login().await {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            warning!("Cannot start login: {}", e);
            error_page(StatusCode::INTERNAL_SERVER_ERROR, "Login failed", &e)
        }
    }
}

pub async fn logout(Extension(state): Extension<AppState>) -> Redirect {
    if let Err(e) = state.session.logout().await {
        warning!("Failed to clear stored tokens: {}", e);
    }
    Redirect::to(Route::Entry.path())
}

pub async fn home(
    Query(params): Query<HashMap<String, String>>,
    Extension(state): Extension<AppState>,
) -> Response {
    if let Err(e) = state.session.reconcile().await {
        warning!("Failed to read session: {}", e);
    }
    if let GuardDecision::Redirect(target) = routes::guard(state.session.state(), Route::Home) {
        return Redirect::to(target.path()).into_response();
    }

    let range = match params.get("range") {
        Some(raw) => match raw.parse::<TimeRange>() {
            Ok(range) => range,
            Err(e) => return error_page(StatusCode::BAD_REQUEST, "Bad request", &e),
        },
        None => TimeRange::default(),
    };

    let stats = async {
        let profile = state.client.profile().await?;
        let tracks = state.client.top_tracks(range, HOME_LIMIT).await?;
        let artists = state.client.top_artists(range, HOME_LIMIT).await?;
        Ok::<_, ClientError>((profile, tracks.items, artists.items))
    }
    .await;

    match stats {
        Ok((profile, tracks, artists)) => {
            Html(render_home(&profile, range, &tracks, &artists)).into_response()
        }
        Err(e) if e.is_auth_failure() => Redirect::to(Route::Entry.path()).into_response(),
        Err(e) => error_page(StatusCode::BAD_GATEWAY, "Could not load your stats", &e),
    }
}

fn render_home(
    profile: &UserProfile,
    range: TimeRange,
    tracks: &[Track],
    artists: &[Artist],
) -> String {
    let ranges = TimeRange::ALL
        .iter()
        .map(|r| {
            format!(
                r#"<a href="{}?range={}">{}</a>"#,
                Route::Home.path(),
                r.as_str(),
                r.display_label()
            )
        })
        .collect::<Vec<_>>()
        .join(" | ");

    let track_items = tracks
        .iter()
        .map(|t| {
            format!(
                "<li>{} - {}</li>",
                escape(&t.name),
                escape(&t.artist_names())
            )
        })
        .collect::<String>();
    let artist_items = artists
        .iter()
        .map(|a| format!("<li>{}</li>", escape(&a.name)))
        .collect::<String>();

    let top_tracks = format!("<h2>Top Tracks</h2><ol>{track_items}</ol>");
    let top_artists = format!("<h2>Top Artists</h2><ol>{artist_items}</ol>");
    let logout = format!(r#"<p><a href="{}">Logout</a></p>"#, Route::Logout.path());
    let body = format!("<p>{ranges}</p>{top_tracks}{top_artists}{logout}");

    let title = format!("{} - {}", profile.name(), range.display_label());
    page(&title, &body)
}

fn error_page(status: StatusCode, title: &str, e: &ClientError) -> Response {
    let body = format!("<p>{}</p>", escape(&e.to_string()));
    (status, Html(page(title, &body))).into_response()
}

fn page(title: &str, body: &str) -> String {
    let title = escape(title);
    let head = format!(r#"<head><meta charset="utf-8"><title>{title}</title></head>"#);
    format!("<!doctype html><html>{head}<body><h1>{title}</h1>{body}</body></html>")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

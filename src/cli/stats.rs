use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    cli::open_session,
    error,
    error::ClientError,
    info,
    spotify::SpotifyClient,
    success,
    types::{ArtistTableRow, PlaylistTableRow, RecentTableRow, TimeRange, TrackTableRow},
    utils, warning,
};

pub async fn profile() {
    let client = SpotifyClient::new(open_session().await);
    let pb = spinner("Fetching profile...");
    let profile = client.profile().await;
    pb.finish_and_clear();

    let profile = profile.unwrap_or_else(|e| fail(e));
    info!("Name: {}", profile.name());
    if let Some(email) = &profile.email {
        info!("Email: {}", email);
    }
    if let Some(country) = &profile.country {
        info!("Country: {}", country);
    }
    if let Some(product) = &profile.product {
        info!("Plan: {}", product);
    }
    if let Some(followers) = &profile.followers {
        info!("Followers: {}", followers.total);
    }
}

pub async fn top_tracks(range: TimeRange, limit: u32, save: bool) {
    let client = SpotifyClient::new(open_session().await);
    let label = range.display_label();
    let pb = spinner(&format!("Fetching top tracks ({label})..."));
    let tracks = client.top_tracks(range, limit).await;
    pb.finish_and_clear();

    let tracks = tracks.unwrap_or_else(|e| fail(e));
    if tracks.items.is_empty() {
        warning!("No top tracks for {}.", label);
        return;
    }

    let rows: Vec<TrackTableRow> = tracks
        .items
        .iter()
        .enumerate()
        .map(|(i, track)| TrackTableRow {
            rank: i + 1,
            name: track.name.clone(),
            artists: track.artist_names(),
            album: track
                .album
                .as_ref()
                .map(|album| album.name.clone())
                .unwrap_or_default(),
            length: utils::format_duration_ms(track.duration_ms),
        })
        .collect();

    let table = Table::new(rows).to_string();
    info!("Top tracks - {}", label);
    println!("{}", table);
    if save {
        save_snapshot("tracks", range, &table).await;
    }
}

pub async fn top_artists(range: TimeRange, limit: u32, save: bool) {
    let client = SpotifyClient::new(open_session().await);
    let label = range.display_label();
    let pb = spinner(&format!("Fetching top artists ({label})..."));
    let artists = client.top_artists(range, limit).await;
    pb.finish_and_clear();

    let artists = artists.unwrap_or_else(|e| fail(e));
    if artists.items.is_empty() {
        warning!("No top artists for {}.", label);
        return;
    }

    let rows: Vec<ArtistTableRow> = artists
        .items
        .into_iter()
        .enumerate()
        .map(|(i, artist)| ArtistTableRow {
            rank: i + 1,
            name: artist.name,
            genres: artist
                .genres
                .into_iter()
                .take(3)
                .collect::<Vec<_>>()
                .join(","),
        })
        .collect();

    let table = Table::new(rows).to_string();
    info!("Top artists - {}", label);
    println!("{}", table);
    if save {
        save_snapshot("artists", range, &table).await;
    }
}

pub async fn playlists(limit: u32) {
    let client = SpotifyClient::new(open_session().await);
    let pb = spinner("Fetching playlists...");
    let playlists = client.playlists(limit).await;
    pb.finish_and_clear();

    let playlists = playlists.unwrap_or_else(|e| fail(e));
    let rows: Vec<PlaylistTableRow> = playlists
        .items
        .into_iter()
        .map(|playlist| PlaylistTableRow {
            name: playlist.name,
            tracks: playlist.tracks.map_or(0, |t| t.total),
            visibility: match (playlist.collaborative, playlist.public) {
                (true, _) => "collaborative".to_string(),
                (false, Some(true)) => "public".to_string(),
                (false, _) => "private".to_string(),
            },
        })
        .collect();

    println!("{}", Table::new(rows));
    if let Some(total) = playlists.total {
        info!("{} playlists in total", total);
    }
}

pub async fn recent(limit: u32) {
    let client = SpotifyClient::new(open_session().await);
    let pb = spinner("Fetching recently played tracks...");
    let history = client.recently_played(limit).await;
    pb.finish_and_clear();

    let history = history.unwrap_or_else(|e| fail(e));
    let rows: Vec<RecentTableRow> = history
        .items
        .into_iter()
        .map(|play| RecentTableRow {
            played_at: play.played_at.clone(),
            artists: play.track.artist_names(),
            name: play.track.name,
        })
        .collect();

    println!("{}", Table::new(rows));
}

/// Writes the rendered table to `polaroid-<kind>-<range>.txt` in the
/// working directory.
async fn save_snapshot(kind: &str, range: TimeRange, table: &str) {
    let file_name = format!("polaroid-{}-{}.txt", kind, range.file_label());
    let content = format!("Top {} - {}\n{}\n", kind, range.display_label(), table);
    match async_fs::write(&file_name, content).await {
        Ok(()) => success!("Saved snapshot to {}", file_name),
        Err(e) => warning!("Failed to save snapshot to {}: {}", file_name, e),
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

fn fail(e: ClientError) -> ! {
    if e.is_auth_failure() {
        error!("{}\nPlease run polaroidcli auth", e)
    }
    error!("{}", e)
}

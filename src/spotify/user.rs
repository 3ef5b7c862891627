use crate::{
    error::Result,
    spotify::SpotifyClient,
    types::{CursorPaging, Paging, PlayHistory, Playlist, UserProfile},
};

impl SpotifyClient {
    pub async fn profile(&self) -> Result<UserProfile> {
        self.get_json("/me", &[]).await
    }

    /// Playlists owned or followed by the user, first page only.
    pub async fn playlists(&self, limit: u32) -> Result<Paging<Playlist>> {
        Self::check_limit(limit)?;
        self.get_json("/me/playlists", &[("limit", limit.to_string())])
            .await
    }

    pub async fn recently_played(&self, limit: u32) -> Result<CursorPaging<PlayHistory>> {
        Self::check_limit(limit)?;
        self.get_json(
            "/me/player/recently-played",
            &[("limit", limit.to_string())],
        )
        .await
    }
}

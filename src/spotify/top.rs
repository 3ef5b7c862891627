use crate::{
    error::Result,
    spotify::SpotifyClient,
    types::{Artist, Paging, TimeRange, Track},
};

impl SpotifyClient {
    /// Retrieves the user's most played tracks for `range`.
    ///
    /// `limit` must be between 1 and 50; anything else fails with
    /// [`crate::error::ClientError::InvalidLimit`] before a request is made.
    ///
    /// # Example
    ///
    /// ```
    /// let tracks = client.top_tracks(TimeRange::ShortTerm, 10).await?;
    /// for track in tracks.items {
    ///     println!("{} - {}", track.name, track.artist_names());
    /// }
    /// ```
    pub async fn top_tracks(&self, range: TimeRange, limit: u32) -> Result<Paging<Track>> {
        Self::check_limit(limit)?;
        self.get_json(
            "/me/top/tracks",
            &[
                ("time_range", range.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    /// Retrieves the user's most played artists for `range`.
    pub async fn top_artists(&self, range: TimeRange, limit: u32) -> Result<Paging<Artist>> {
        Self::check_limit(limit)?;
        self.get_json(
            "/me/top/artists",
            &[
                ("time_range", range.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }
}

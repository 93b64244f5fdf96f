use color_eyre::eyre::Result;

/// Decoupled representation of a Spotify playlist from the API.
#[derive(Debug, Clone)]
pub struct SpotifyApiPlaylist {
    pub name: String,
    pub total_tracks: i32,
}

/// Decoupled representation of a Spotify track from the API.
#[derive(Debug, Clone)]
pub struct SpotifyApiTrack {
    pub name: String,
    pub artists: Vec<String>,
}

/// Port trait wrapping the Spotify API capabilities used by the import source.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyClient: Send + Sync {
    async fn playlist(&self, playlist_id: &str) -> Result<SpotifyApiPlaylist>;
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyApiTrack>>;
}

use color_eyre::eyre::{Result, eyre};
use url::Url;

use crate::ports::source::{RawSource, SourceReader, SourceRows, StreamingTrack};
use crate::ports::spotify::SpotifyClient;

/// Extract the playlist id from a share URL, a `spotify:playlist:` URI or a bare id.
pub fn parse_playlist_id(input: &str) -> Result<String> {
    let input = input.trim();
    let is_id = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric());

    if let Some(id) = input.strip_prefix("spotify:playlist:") {
        return is_id(id)
            .then(|| id.to_string())
            .ok_or(eyre!("Invalid Spotify playlist URI: {}", input));
    }

    if let Ok(url) = Url::parse(input) {
        let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
        return segments
            .windows(2)
            .find(|pair| pair[0] == "playlist" && is_id(pair[1]))
            .map(|pair| pair[1].to_string())
            .ok_or(eyre!("Not a Spotify playlist URL: {}", input));
    }

    if is_id(input) {
        return Ok(input.to_string());
    }

    Err(eyre!("Not a Spotify playlist URL or id: {}", input))
}

/// A Spotify playlist used as an import source. Its name becomes the default
/// playlist name and its tracks are resolved by search.
pub struct SpotifyPlaylistSource<C: SpotifyClient> {
    client: C,
    playlist_id: String,
}

impl<C: SpotifyClient> SpotifyPlaylistSource<C> {
    pub fn new(client: C, playlist_id: String) -> Self {
        Self {
            client,
            playlist_id,
        }
    }
}

#[async_trait::async_trait]
impl<C: SpotifyClient> SourceReader for SpotifyPlaylistSource<C> {
    fn describe(&self) -> String {
        format!("Spotify playlist {}", self.playlist_id)
    }

    async fn read(&self) -> Result<RawSource> {
        let playlist = self.client.playlist(&self.playlist_id).await?;
        log::info!(
            "Fetching Spotify playlist '{}' ({} tracks)",
            playlist.name,
            playlist.total_tracks
        );

        let tracks = self.client.playlist_tracks(&self.playlist_id).await?;
        let rows = tracks
            .into_iter()
            .map(|track| StreamingTrack {
                title: track.name,
                artists: track.artists,
            })
            .collect();

        Ok(RawSource {
            name: playlist.name,
            rows: SourceRows::Streaming(rows),
        })
    }
}

use color_eyre::eyre::{Context, Result};

use crate::config::SpotifyConfig;
use crate::ports::spotify::{SpotifyApiPlaylist, SpotifyApiTrack, SpotifyClient};
use crate::spotify_rs::auth::request_client_credentials_token;
use crate::spotify_rs::client::SpotifyApi;
use crate::spotify_rs::types::{SpotifyPlaylist, SpotifyTrack};

/// Production implementation of `SpotifyClient` using app-only credentials.
pub struct SpotifyHttpAdapter {
    api: SpotifyApi,
}

impl SpotifyHttpAdapter {
    /// Exchange the client credentials for a token up front, so bad credentials
    /// fail before any source is read.
    pub async fn connect(config: &SpotifyConfig) -> Result<Self> {
        let client = reqwest::Client::new();
        let token =
            request_client_credentials_token(&client, &config.client_id, &config.client_secret)
                .await
                .wrap_err("Failed to authenticate with Spotify")?;

        Ok(Self {
            api: SpotifyApi::new(client, token.access_token),
        })
    }
}

fn to_api_playlist(playlist: SpotifyPlaylist) -> SpotifyApiPlaylist {
    SpotifyApiPlaylist {
        name: playlist.name,
        total_tracks: playlist.tracks.total,
    }
}

fn to_api_track(track: SpotifyTrack) -> SpotifyApiTrack {
    SpotifyApiTrack {
        name: track.name,
        artists: track.artists.into_iter().map(|a| a.name).collect(),
    }
}

#[async_trait::async_trait]
impl SpotifyClient for SpotifyHttpAdapter {
    async fn playlist(&self, playlist_id: &str) -> Result<SpotifyApiPlaylist> {
        let playlist = self
            .api
            .get_playlist(playlist_id)
            .await
            .wrap_err_with(|| format!("Failed to fetch Spotify playlist {}", playlist_id))?;
        Ok(to_api_playlist(playlist))
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyApiTrack>> {
        let tracks = self
            .api
            .get_playlist_tracks(playlist_id)
            .await
            .wrap_err_with(|| format!("Failed to fetch tracks of Spotify playlist {}", playlist_id))?;
        Ok(tracks.into_iter().map(to_api_track).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_conversion_flattens_artists() {
        let track: SpotifyTrack = serde_json::from_value(serde_json::json!({
            "id": null,
            "name": "Local Song",
            "artists": [{"name": "Artist X", "id": "1"}, {"name": "Artist Y"}],
            "album": {"name": "Album", "id": "2"},
            "duration_ms": 1000
        }))
        .unwrap();

        let converted = to_api_track(track);

        assert_eq!(converted.name, "Local Song");
        assert_eq!(converted.artists, ["Artist X", "Artist Y"]);
    }

    #[test]
    fn test_playlist_conversion() {
        let playlist: SpotifyPlaylist = serde_json::from_value(serde_json::json!({
            "id": "37i9dQZF1DXcBWIGoYBM5M",
            "name": "Today's Top Hits",
            "description": null,
            "tracks": {"total": 50}
        }))
        .unwrap();

        let converted = to_api_playlist(playlist);
        assert_eq!(converted.name, "Today's Top Hits");
        assert_eq!(converted.total_tracks, 50);
    }
}

use std::time::Duration;

use color_eyre::Result;
use serde::Deserialize;

use crate::spotify_rs::types::{SpotifyPlaylist, SpotifyTrack};

const API_BASE: &str = "https://api.spotify.com/v1";

/// Spotify Web API client
#[derive(Debug, Clone)]
pub struct SpotifyApi {
    access_token: String,
    client: reqwest::Client,
}

impl SpotifyApi {
    pub fn new(client: reqwest::Client, access_token: String) -> Self {
        Self {
            access_token,
            client,
        }
    }

    /// Get playlist metadata
    pub async fn get_playlist(&self, playlist_id: &str) -> Result<SpotifyPlaylist> {
        let response = self
            .client
            .get(format!(
                "{}/playlists/{}?fields=name,tracks.total",
                API_BASE, playlist_id
            ))
            .bearer_auth(&self.access_token)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?;

        let playlist: SpotifyPlaylist = response.json().await?;
        Ok(playlist)
    }

    /// Get all tracks in a playlist. Episodes and removed tracks are skipped.
    pub async fn get_playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyTrack>> {
        let mut all_tracks = Vec::new();
        let mut next_url = Some(format!(
            "{}/playlists/{}/tracks?limit=100&additional_types=track",
            API_BASE, playlist_id
        ));

        while let Some(url) = next_url {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.access_token)
                .timeout(Duration::from_secs(10))
                .send()
                .await?
                .error_for_status()?;

            #[derive(Deserialize)]
            struct PlaylistTrackObject {
                track: Option<serde_json::Value>,
            }

            #[derive(Deserialize)]
            struct TracksResponse {
                items: Vec<PlaylistTrackObject>,
                next: Option<String>,
            }

            let page: TracksResponse = response.json().await?;
            for item in page.items {
                let Some(value) = item.track else {
                    continue;
                };
                match serde_json::from_value::<SpotifyTrack>(value) {
                    Ok(track) => all_tracks.push(track),
                    Err(e) => log::debug!("Skipping non-track playlist item: {}", e),
                }
            }
            next_url = page.next;
        }

        Ok(all_tracks)
    }
}

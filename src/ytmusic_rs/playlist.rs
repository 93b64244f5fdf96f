use serde_json::{Value, json};

use crate::ytmusic_rs::types::{LibraryPlaylist, PlaylistItem};
use crate::ytmusic_rs::{InnertubeError, YtMusicSession, parse};

const LIBRARY_PLAYLISTS_BROWSE_ID: &str = "FEmusic_liked_playlists";
const EDIT_SUCCEEDED: &str = "STATUS_SUCCEEDED";

/// Interpret the raw body of an `edit_playlist` call. Anything but an explicit
/// success status is rejected with the body preserved.
fn edit_outcome(body: String) -> Result<(), InnertubeError> {
    let Ok(response) = serde_json::from_str::<Value>(&body) else {
        return Err(InnertubeError::InvalidResponse { body });
    };

    match response.get("status").and_then(Value::as_str) {
        Some(EDIT_SUCCEEDED) => Ok(()),
        _ => Err(InnertubeError::Rejected { body }),
    }
}

fn browse_playlist_id(playlist_id: &str) -> String {
    if playlist_id.starts_with("VL") {
        playlist_id.to_string()
    } else {
        format!("VL{}", playlist_id)
    }
}

impl YtMusicSession {
    /// All playlists in the signed-in user's library
    pub async fn get_library_playlists(&self) -> Result<Vec<LibraryPlaylist>, InnertubeError> {
        let playlists = self
            .browse_all(LIBRARY_PLAYLISTS_BROWSE_ID, parse::library_playlists)
            .await?;
        log::debug!("Library has {} playlists", playlists.len());
        Ok(playlists)
    }

    /// Every track of a playlist, following continuations
    pub async fn get_playlist_items(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistItem>, InnertubeError> {
        self.browse_all(&browse_playlist_id(playlist_id), parse::playlist_items)
            .await
    }

    /// Create a private playlist and return its id
    pub async fn create_playlist(
        &self,
        title: &str,
        description: &str,
    ) -> Result<String, InnertubeError> {
        let body = self
            .send(
                "playlist/create",
                json!({
                    "title": title,
                    "description": description,
                    "privacyStatus": "PRIVATE",
                }),
                None,
            )
            .await?;

        serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|response| {
                response
                    .get("playlistId")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .ok_or(InnertubeError::InvalidResponse { body })
    }

    /// Append videos to a playlist, skipping ones already in it
    pub async fn add_playlist_items(
        &self,
        playlist_id: &str,
        video_ids: &[String],
    ) -> Result<(), InnertubeError> {
        let actions: Vec<Value> = video_ids
            .iter()
            .map(|id| {
                json!({
                    "action": "ACTION_ADD_VIDEO",
                    "addedVideoId": id,
                    "dedupeOption": "DEDUPE_OPTION_SKIP",
                })
            })
            .collect();

        let body = self
            .send(
                "browse/edit_playlist",
                json!({
                    "playlistId": playlist_id.strip_prefix("VL").unwrap_or(playlist_id),
                    "actions": actions,
                }),
                None,
            )
            .await?;

        edit_outcome(body)
    }
}

use serde::{Deserialize, Serialize};

use crate::ports::ytmusic::PlaylistStore;
use crate::services::import::types::ImportError;

/// What to do when a playlist with the target name already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaylistMode {
    /// Reuse the first playlist with the exact same name, create one otherwise.
    #[default]
    Append,
    /// Always create a new playlist. Same-named playlists may pile up.
    Replace,
}

/// Map a playlist name to a remote playlist id, reusing or creating as `mode` says.
pub async fn materialize_playlist<P: PlaylistStore>(
    store: &P,
    name: &str,
    mode: PlaylistMode,
) -> Result<String, ImportError> {
    let create_error = |reason: String| ImportError::PlaylistCreate {
        name: name.to_string(),
        reason,
    };

    if mode == PlaylistMode::Append {
        let playlists = store
            .list_playlists()
            .await
            .map_err(|e| create_error(format!("failed to list existing playlists: {}", e)))?;

        if let Some(existing) = playlists.into_iter().find(|p| p.name == name) {
            log::info!(
                "Appending to existing playlist '{}' (ID: {})",
                existing.name,
                existing.id
            );
            return Ok(existing.id);
        }
    }

    log::info!("Creating playlist '{}'", name);
    let id = store
        .create_playlist(name, "")
        .await
        .map_err(|e| create_error(e.to_string()))?;
    log::info!("Created playlist '{}' (ID: {})", name, id);

    Ok(id)
}

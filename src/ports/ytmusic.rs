use serde::Serialize;

/// A single search hit returned by the remote music service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
    pub video_id: String,
    pub title: String,
    pub artist: Option<String>,
}

/// A playlist in the remote library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePlaylist {
    pub id: String,
    pub name: String,
}

/// A track inside a remote playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub video_id: Option<String>,
    pub title: String,
    pub artists: Vec<String>,
}

/// Failure reported by a remote call.
///
/// `message` carries the raw error text or response payload. The delivery engine
/// inspects it, so adapters must not summarize it away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

/// Port trait wrapping the song search capability of the target service.
///
/// Implementations live in `services::ytmusic::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MusicSearch: Send + Sync {
    async fn search_songs(&self, query: &str) -> Result<Vec<SearchCandidate>, RemoteError>;
}

/// Port trait wrapping the playlist capabilities of the target service.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn list_playlists(&self) -> Result<Vec<RemotePlaylist>, RemoteError>;

    /// Returns the id of the newly created playlist.
    async fn create_playlist(&self, name: &str, description: &str)
    -> Result<String, RemoteError>;

    async fn add_tracks(&self, playlist_id: &str, video_ids: &[String])
    -> Result<(), RemoteError>;

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<RemoteTrack>, RemoteError>;
}

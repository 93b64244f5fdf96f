use crate::ports::ytmusic::{
    MusicSearch, PlaylistStore, RemoteError, RemotePlaylist, RemoteTrack, SearchCandidate,
};
use crate::ytmusic_rs::{BrowserCredentials, InnertubeError, YtMusicSession};

impl From<InnertubeError> for RemoteError {
    fn from(error: InnertubeError) -> Self {
        match error {
            InnertubeError::Status { status, body } => RemoteError::with_status(status, body),
            InnertubeError::Rejected { body } | InnertubeError::InvalidResponse { body } => {
                RemoteError::new(body)
            }
            InnertubeError::FailedToSendRequest(e) => match e.status() {
                Some(status) => RemoteError::with_status(status.as_u16(), e.to_string()),
                None => RemoteError::new(e.to_string()),
            },
            other => RemoteError::new(other.to_string()),
        }
    }
}

/// Production implementation of the YouTube Music ports over the innertube API.
#[derive(Clone)]
pub struct YtMusicHttpAdapter {
    session: YtMusicSession,
}

impl YtMusicHttpAdapter {
    pub fn new(credentials: BrowserCredentials) -> Self {
        Self {
            session: YtMusicSession::new(credentials),
        }
    }
}

#[async_trait::async_trait]
impl MusicSearch for YtMusicHttpAdapter {
    async fn search_songs(&self, query: &str) -> Result<Vec<SearchCandidate>, RemoteError> {
        let results = self.session.search_songs(query).await?;
        Ok(results
            .into_iter()
            .map(|song| SearchCandidate {
                video_id: song.video_id,
                title: song.title,
                artist: (!song.artists.is_empty()).then(|| song.artists.join(", ")),
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl PlaylistStore for YtMusicHttpAdapter {
    async fn list_playlists(&self) -> Result<Vec<RemotePlaylist>, RemoteError> {
        let playlists = self.session.get_library_playlists().await?;
        Ok(playlists
            .into_iter()
            .map(|p| RemotePlaylist {
                id: p.playlist_id,
                name: p.title,
            })
            .collect())
    }

    async fn create_playlist(&self, name: &str, description: &str) -> Result<String, RemoteError> {
        Ok(self.session.create_playlist(name, description).await?)
    }

    async fn add_tracks(&self, playlist_id: &str, video_ids: &[String]) -> Result<(), RemoteError> {
        Ok(self
            .session
            .add_playlist_items(playlist_id, video_ids)
            .await?)
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<RemoteTrack>, RemoteError> {
        let items = self.session.get_playlist_items(playlist_id).await?;
        Ok(items
            .into_iter()
            .map(|item| RemoteTrack {
                video_id: item.video_id,
                title: item.title,
                artists: item.artists,
            })
            .collect())
    }
}

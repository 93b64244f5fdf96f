/// A song row from a filtered search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongResult {
    pub video_id: String,
    pub title: String,
    pub artists: Vec<String>,
}

/// A playlist in the signed-in user's library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPlaylist {
    /// Playlist id without the `VL` browse prefix
    pub playlist_id: String,
    pub title: String,
}

/// A row of a playlist's track list. Unavailable tracks have no video id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    pub video_id: Option<String>,
    pub title: String,
    pub artists: Vec<String>,
}

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImportError {
    #[error("Malformed row: {reason}")]
    MalformedRow { reason: String },

    #[error("Unrecognized header in '{source_name}': no id, URL or title column")]
    UnrecognizedHeader { source_name: String },

    #[error("No search results for '{query}'")]
    NotFound { query: String },

    #[error("Search for '{query}' failed: {reason}")]
    SearchFailed { query: String, reason: String },

    #[error("Failed to create playlist '{name}': {reason}")]
    PlaylistCreate { name: String, reason: String },

    #[error("Delivery failed after {attempts} attempt(s): {reason}")]
    DeliveryFailure { attempts: u32, reason: String },

    #[error("{reason}")]
    Precondition { reason: String },
}

/// Where a track came from: the source name and the 1-based record number in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRow {
    pub source: String,
    pub line: usize,
}

impl std::fmt::Display for SourceRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

/// One song to import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    pub title: String,
    pub artist: Option<String>,
    pub target_id: Option<String>,
    pub source_row: SourceRow,
}

impl Track {
    pub fn is_resolved(&self) -> bool {
        self.target_id.is_some()
    }

    /// Search query used to resolve the track: "{title} {artist}".
    pub fn search_query(&self) -> String {
        match &self.artist {
            Some(artist) => format!("{} {}", self.title, artist),
            None => self.title.clone(),
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.artist {
            Some(artist) => write!(f, "{} by {}", self.title, artist),
            None => write!(f, "{}", self.title),
        }
    }
}

/// A normalized track together with the playlist it is destined for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTrack {
    pub playlist: String,
    pub track: Track,
}

/// Ordered tracks destined for one named playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistGroup {
    pub name: String,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackFailure {
    pub track: Track,
    pub reason: ImportError,
}

/// Outcome of delivering one playlist group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub playlist_name: String,
    pub playlist_id: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<TrackFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupFailure {
    pub playlist_name: String,
    pub track_count: usize,
    pub reason: ImportError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row: SourceRow,
    pub reason: ImportError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

/// Aggregated outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub results: Vec<ImportResult>,
    pub group_failures: Vec<GroupFailure>,
    pub row_failures: Vec<RowFailure>,
    pub source_failures: Vec<SourceFailure>,
}

impl ImportReport {
    pub fn playlists_processed(&self) -> usize {
        self.results.len()
    }

    pub fn total_attempted(&self) -> usize {
        self.results.iter().map(|r| r.attempted).sum()
    }

    pub fn total_succeeded(&self) -> usize {
        self.results.iter().map(|r| r.succeeded).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.results.iter().map(|r| r.failed.len()).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.total_failed() > 0
            || !self.group_failures.is_empty()
            || !self.row_failures.is_empty()
            || !self.source_failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, artist: Option<&str>) -> Track {
        Track {
            title: title.to_string(),
            artist: artist.map(String::from),
            target_id: None,
            source_row: SourceRow {
                source: "test".to_string(),
                line: 1,
            },
        }
    }

    #[test]
    fn test_search_query_with_artist() {
        assert_eq!(
            track("Song A", Some("Artist X")).search_query(),
            "Song A Artist X"
        );
    }

    #[test]
    fn test_search_query_without_artist() {
        assert_eq!(track("Song A", None).search_query(), "Song A");
    }

    #[test]
    fn test_report_totals() {
        let report = ImportReport {
            results: vec![
                ImportResult {
                    playlist_name: "A".into(),
                    playlist_id: "PL1".into(),
                    attempted: 3,
                    succeeded: 2,
                    failed: vec![TrackFailure {
                        track: track("Lost", None),
                        reason: ImportError::NotFound {
                            query: "Lost".into(),
                        },
                    }],
                },
                ImportResult {
                    playlist_name: "B".into(),
                    playlist_id: "PL2".into(),
                    attempted: 1,
                    succeeded: 1,
                    failed: vec![],
                },
            ],
            ..Default::default()
        };

        assert_eq!(report.playlists_processed(), 2);
        assert_eq!(report.total_attempted(), 4);
        assert_eq!(report.total_succeeded(), 3);
        assert_eq!(report.total_failed(), 1);
        assert!(report.has_failures());
    }
}

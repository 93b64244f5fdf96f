use std::sync::OnceLock;

use regex::Regex;

use crate::ports::source::{RawRecord, RawSource, SourceRows, StreamingTrack};
use crate::services::import::types::{
    ImportError, NormalizedTrack, RowFailure, SourceRow, Track,
};

/// Order in which CSV schemas are tried against a header. A header with both an id
/// and a URL column is read as `Full`.
pub const SCHEMA_PRECEDENCE: [SchemaKind; 3] =
    [SchemaKind::Full, SchemaKind::Url, SchemaKind::Simple];

/// Playlist name used when neither a playlist column nor a source name is available.
const FALLBACK_PLAYLIST_NAME: &str = "Imported playlist";

const ID_COLUMNS: &[&str] = &["mediaid", "videoid", "media_id", "video_id"];
const URL_COLUMNS: &[&str] = &["url", "link"];
const TITLE_COLUMNS: &[&str] = &["title", "name"];
const ARTIST_COLUMNS: &[&str] = &["artist", "artists"];
const PLAYLIST_COLUMNS: &[&str] = &["playlistname", "playlist"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// Has a media/video id column.
    Full,
    /// Has a URL column the id can be extracted from.
    Url,
    /// Title/artist only, ids must be found by search.
    Simple,
}

/// Column positions for one CSV source, detected once from its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvLayout {
    pub schema: SchemaKind,
    id: Option<usize>,
    url: Option<usize>,
    title: Option<usize>,
    artist: Option<usize>,
    playlist: Option<usize>,
}

/// Tracks and per-row failures produced from one source.
#[derive(Debug, Default)]
pub struct Normalized {
    pub tracks: Vec<NormalizedTrack>,
    pub failures: Vec<RowFailure>,
}

fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.trim().to_lowercase();
        aliases.contains(&header.as_str())
    })
}

/// Detect the schema of a CSV source from its header row.
pub fn detect_layout(headers: &[String]) -> Option<CsvLayout> {
    let id = find_column(headers, ID_COLUMNS);
    let url = find_column(headers, URL_COLUMNS);
    let title = find_column(headers, TITLE_COLUMNS);

    let schema = SCHEMA_PRECEDENCE.into_iter().find(|kind| match kind {
        SchemaKind::Full => id.is_some(),
        SchemaKind::Url => url.is_some(),
        SchemaKind::Simple => title.is_some(),
    })?;

    Some(CsvLayout {
        schema,
        id,
        url,
        title,
        artist: find_column(headers, ARTIST_COLUMNS),
        playlist: find_column(headers, PLAYLIST_COLUMNS),
    })
}

fn video_id_regex() -> &'static Regex {
    static VIDEO_ID: OnceLock<Regex> = OnceLock::new();
    VIDEO_ID.get_or_init(|| {
        Regex::new(
            r"(?:[?&]v=|youtu\.be/|/embed/|/shorts/|/live/|/v/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        )
        .expect("video id pattern is valid")
    })
}

/// Extract the 11 character video id from a YouTube / YouTube Music URL.
///
/// Handles `watch?v=`, `youtu.be/` short links and `/embed/`, `/shorts/`, `/live/` paths.
pub fn extract_video_id(url: &str) -> Option<&str> {
    video_id_regex()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn cell(record: &RawRecord, column: Option<usize>) -> Option<&str> {
    column
        .and_then(|idx| record.fields.get(idx))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn malformed(reason: impl Into<String>) -> ImportError {
    ImportError::MalformedRow {
        reason: reason.into(),
    }
}

fn normalize_record(
    layout: &CsvLayout,
    default_playlist: &str,
    source_row: SourceRow,
    record: &RawRecord,
) -> Result<NormalizedTrack, ImportError> {
    let title = cell(record, layout.title);
    let artist = cell(record, layout.artist).map(String::from);

    let (title, target_id) = match layout.schema {
        SchemaKind::Full => match (cell(record, layout.id), title) {
            (Some(id), title) => (title.unwrap_or(id), Some(id.to_string())),
            // A blank id falls back to the URL column, then to a search by title
            (None, title) => {
                let url = cell(record, layout.url);
                match (url.and_then(extract_video_id), title) {
                    (Some(id), title) => (title.or(url).unwrap_or(id), Some(id.to_string())),
                    (None, Some(title)) => (title, None),
                    (None, None) => {
                        return Err(malformed("missing media id, usable URL and title"));
                    }
                }
            }
        },
        SchemaKind::Url => {
            let url = cell(record, layout.url).ok_or_else(|| malformed("missing URL"))?;
            let id = extract_video_id(url)
                .ok_or_else(|| malformed(format!("no video id found in URL '{}'", url)))?;
            (title.unwrap_or(url), Some(id.to_string()))
        }
        SchemaKind::Simple => {
            let title = title.ok_or_else(|| malformed("missing title"))?;
            (title, None)
        }
    };

    let playlist = cell(record, layout.playlist).unwrap_or(default_playlist);

    Ok(NormalizedTrack {
        playlist: playlist.to_string(),
        track: Track {
            title: title.to_string(),
            artist,
            target_id,
            source_row,
        },
    })
}

fn normalize_streaming(
    default_playlist: &str,
    source_row: SourceRow,
    track: &StreamingTrack,
) -> Result<NormalizedTrack, ImportError> {
    let title = track.title.trim();
    if title.is_empty() {
        return Err(malformed("streaming track has no title"));
    }

    let artists: Vec<&str> = track
        .artists
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();
    let artist = (!artists.is_empty()).then(|| artists.join(", "));

    Ok(NormalizedTrack {
        playlist: default_playlist.to_string(),
        track: Track {
            title: title.to_string(),
            artist,
            target_id: None,
            source_row,
        },
    })
}

/// Convert every row of a source into tracks. Malformed rows are collected, not raised.
///
/// Fails only when a CSV header matches none of the known schemas.
pub fn normalize_source(source: &RawSource) -> Result<Normalized, ImportError> {
    let default_playlist = match source.name.trim() {
        "" => FALLBACK_PLAYLIST_NAME,
        name => name,
    };
    let row_ref = |line: usize| SourceRow {
        source: source.name.clone(),
        line,
    };

    let mut normalized = Normalized::default();
    let mut push = |row: SourceRow, result: Result<NormalizedTrack, ImportError>| match result {
        Ok(track) => normalized.tracks.push(track),
        Err(reason) => {
            log::warn!("Skipping row {}: {}", row, reason);
            normalized.failures.push(RowFailure { row, reason });
        }
    };

    match &source.rows {
        SourceRows::Csv { headers, records } => {
            let layout =
                detect_layout(headers).ok_or_else(|| ImportError::UnrecognizedHeader {
                    source_name: source.name.clone(),
                })?;
            log::debug!("Source '{}' detected as {:?} schema", source.name, layout.schema);

            for record in records {
                let row = row_ref(record.line);
                let result = normalize_record(&layout, default_playlist, row.clone(), record);
                push(row, result);
            }
        }
        SourceRows::Streaming(tracks) => {
            for (idx, track) in tracks.iter().enumerate() {
                let row = row_ref(idx + 1);
                let result = normalize_streaming(default_playlist, row.clone(), track);
                push(row, result);
            }
        }
    }

    Ok(normalized)
}

use color_eyre::eyre::Result;

/// One CSV record, with the 1-based record number it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub line: usize,
    pub fields: Vec<String>,
}

/// A track pulled from a third-party streaming playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingTrack {
    pub title: String,
    pub artists: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRows {
    Csv {
        headers: Vec<String>,
        records: Vec<RawRecord>,
    },
    Streaming(Vec<StreamingTrack>),
}

/// Rows of one input plus the name used as the default playlist name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSource {
    pub name: String,
    pub rows: SourceRows,
}

/// Port trait for anything that can feed rows into an import run
/// (a CSV file, a streaming-service playlist, ...).
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SourceReader: Send + Sync {
    /// Human readable origin, used when reading fails.
    fn describe(&self) -> String;

    async fn read(&self) -> Result<RawSource>;
}

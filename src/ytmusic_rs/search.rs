use serde_json::json;

use crate::ytmusic_rs::types::SongResult;
use crate::ytmusic_rs::{InnertubeError, YtMusicSession, parse};

/// Search params restricting results to the "Songs" shelf.
const SONGS_FILTER: &str = concat!("EgWKAQII", "AWoMEA4QChADEAQQCRAF");

impl YtMusicSession {
    /// Search songs only, results in the service's ranking order
    pub async fn search_songs(&self, query: &str) -> Result<Vec<SongResult>, InnertubeError> {
        let response = self
            .post(
                "search",
                json!({ "query": query, "params": SONGS_FILTER }),
                None,
            )
            .await?;

        let results = parse::song_results(&response);
        log::debug!("Search '{}' returned {} songs", query, results.len());
        Ok(results)
    }
}

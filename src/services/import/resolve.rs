use crate::ports::ytmusic::MusicSearch;
use crate::services::import::pacing::Pacer;
use crate::services::import::types::{ImportError, Track};

/// Finds a target-service id for tracks that arrived without one.
///
/// The first search hit is taken as-is. Misses are reported against the track rather
/// than guessed at, so the caller can fix the input and run again.
pub struct Resolver<'a, S: MusicSearch> {
    search: &'a S,
    pacer: &'a Pacer,
}

impl<'a, S: MusicSearch> Resolver<'a, S> {
    pub fn new(search: &'a S, pacer: &'a Pacer) -> Self {
        Self { search, pacer }
    }

    /// Fill in `track.target_id`. Already resolved tracks are left untouched.
    pub async fn resolve(&self, track: &mut Track) -> Result<(), ImportError> {
        if track.is_resolved() {
            return Ok(());
        }

        let query = track.search_query();
        self.pacer.before_search().await;
        log::info!("Searching: {}", query);

        let candidates = self.search.search_songs(&query).await.map_err(|e| {
            ImportError::SearchFailed {
                query: query.clone(),
                reason: e.to_string(),
            }
        })?;

        let first = candidates
            .into_iter()
            .next()
            .ok_or_else(|| ImportError::NotFound {
                query: query.clone(),
            })?;

        log::debug!(
            "Resolved '{}' to {} ({})",
            query,
            first.video_id,
            first.title
        );
        track.target_id = Some(first.video_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ytmusic::{MockMusicSearch, RemoteError, SearchCandidate};
    use crate::config::{DeliveryConfig, ResolverConfig};
    use crate::services::import::types::SourceRow;
    use std::time::{Duration, Instant};

    fn unresolved(title: &str, artist: Option<&str>) -> Track {
        Track {
            title: title.to_string(),
            artist: artist.map(String::from),
            target_id: None,
            source_row: SourceRow {
                source: "My Mix".to_string(),
                line: 1,
            },
        }
    }

    fn candidate(video_id: &str) -> SearchCandidate {
        SearchCandidate {
            video_id: video_id.to_string(),
            title: "Some Song".to_string(),
            artist: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_takes_first_candidate() {
        let mut search = MockMusicSearch::new();
        search
            .expect_search_songs()
            .withf(|query| query == "Song A Artist X")
            .times(1)
            .returning(|_| Ok(vec![candidate("first000001"), candidate("second00002")]));
        let pacer = Pacer::unpaced();
        let resolver = Resolver::new(&search, &pacer);

        let mut track = unresolved("Song A", Some("Artist X"));
        resolver.resolve(&mut track).await.unwrap();

        assert_eq!(track.target_id.as_deref(), Some("first000001"));
    }

    #[tokio::test]
    async fn test_resolve_omits_missing_artist_from_query() {
        let mut search = MockMusicSearch::new();
        search
            .expect_search_songs()
            .withf(|query| query == "Song A")
            .times(1)
            .returning(|_| Ok(vec![candidate("first000001")]));
        let pacer = Pacer::unpaced();
        let resolver = Resolver::new(&search, &pacer);

        let mut track = unresolved("Song A", None);
        resolver.resolve(&mut track).await.unwrap();
        assert!(track.is_resolved());
    }

    #[tokio::test]
    async fn test_resolve_no_candidates_is_not_found() {
        let mut search = MockMusicSearch::new();
        search.expect_search_songs().returning(|_| Ok(vec![]));
        let pacer = Pacer::unpaced();
        let resolver = Resolver::new(&search, &pacer);

        let mut track = unresolved("Nothing", None);
        let err = resolver.resolve(&mut track).await.unwrap_err();

        assert_eq!(
            err,
            ImportError::NotFound {
                query: "Nothing".to_string()
            }
        );
        assert!(!track.is_resolved());
    }

    #[tokio::test]
    async fn test_resolve_search_error_is_terminal() {
        let mut search = MockMusicSearch::new();
        search
            .expect_search_songs()
            .times(1)
            .returning(|_| Err(RemoteError::with_status(500, "backend error")));
        let pacer = Pacer::unpaced();
        let resolver = Resolver::new(&search, &pacer);

        let mut track = unresolved("Song A", None);
        let err = resolver.resolve(&mut track).await.unwrap_err();
        assert!(matches!(err, ImportError::SearchFailed { .. }));
    }

    #[tokio::test]
    async fn test_resolved_track_skips_search() {
        let mut search = MockMusicSearch::new();
        search.expect_search_songs().never();
        let pacer = Pacer::unpaced();
        let resolver = Resolver::new(&search, &pacer);

        let mut track = unresolved("Song A", None);
        track.target_id = Some("dQw4w9WgXcQ".to_string());
        resolver.resolve(&mut track).await.unwrap();

        assert_eq!(track.target_id.as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[tokio::test]
    async fn test_resolve_spaces_searches_by_search_delay() {
        let mut search = MockMusicSearch::new();
        search
            .expect_search_songs()
            .times(3)
            .returning(|_| Ok(vec![candidate("first000001")]));
        let delivery = DeliveryConfig {
            batch_delay_ms: 0,
            ..DeliveryConfig::default()
        };
        let pacer = Pacer::from_config(&ResolverConfig { search_delay_ms: 40 }, &delivery);
        let resolver = Resolver::new(&search, &pacer);

        let start = Instant::now();
        for title in ["Song A", "Song B", "Song C"] {
            let mut track = unresolved(title, None);
            resolver.resolve(&mut track).await.unwrap();
        }

        assert!(
            start.elapsed() >= Duration::from_millis(75),
            "elapsed {:?}",
            start.elapsed()
        );
    }
}

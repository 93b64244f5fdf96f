pub mod delivery;
pub mod group;
pub mod materialize;
pub mod normalize;
pub mod pacing;
pub mod resolve;
pub mod types;

use crate::config::{DeliveryConfig, ResolverConfig};
use crate::ports::source::SourceReader;
use crate::ports::ytmusic::{MusicSearch, PlaylistStore};
use delivery::DeliveryEngine;
use group::group_tracks;
use materialize::{PlaylistMode, materialize_playlist};
use normalize::normalize_source;
use pacing::Pacer;
use resolve::Resolver;
use types::{
    GroupFailure, ImportError, ImportReport, ImportResult, PlaylistGroup, SourceFailure,
    TrackFailure,
};

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub mode: PlaylistMode,
    pub delivery: DeliveryConfig,
    pub resolver: ResolverConfig,
}

/// Runs one import: read sources, normalize, group, then per playlist
/// materialize, resolve and deliver.
///
/// Remote calls are issued one at a time. Only a precondition failure stops the run;
/// everything else is recorded in the report.
pub struct ImportService<S: MusicSearch, P: PlaylistStore> {
    search: S,
    store: P,
    options: ImportOptions,
    pacer: Pacer,
}

impl<S: MusicSearch, P: PlaylistStore> ImportService<S, P> {
    pub fn new(search: S, store: P, options: ImportOptions) -> Self {
        let pacer = Pacer::from_config(&options.resolver, &options.delivery);
        Self {
            search,
            store,
            options,
            pacer,
        }
    }

    pub async fn run(
        &self,
        sources: &[Box<dyn SourceReader>],
    ) -> Result<ImportReport, ImportError> {
        if sources.is_empty() {
            return Err(ImportError::Precondition {
                reason: "No input sources given".to_string(),
            });
        }

        let mut report = ImportReport::default();
        let mut tracks = Vec::new();

        for reader in sources {
            let raw = match reader.read().await {
                Ok(raw) => raw,
                Err(e) => {
                    log::error!("Failed to read {}: {:#}", reader.describe(), e);
                    report.source_failures.push(SourceFailure {
                        source: reader.describe(),
                        reason: format!("{:#}", e),
                    });
                    continue;
                }
            };

            match normalize_source(&raw) {
                Ok(normalized) => {
                    log::info!(
                        "Read {} tracks from '{}' ({} rows skipped)",
                        normalized.tracks.len(),
                        raw.name,
                        normalized.failures.len()
                    );
                    report.row_failures.extend(normalized.failures);
                    tracks.extend(normalized.tracks);
                }
                Err(e) => {
                    log::error!("{}", e);
                    report.source_failures.push(SourceFailure {
                        source: raw.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let groups = group_tracks(tracks);
        if groups.is_empty() {
            log::warn!("No tracks to import");
        }

        for group in groups {
            match self.import_group(group).await {
                Ok(result) => report.results.push(result),
                Err(failure) => {
                    log::error!("Skipping playlist '{}': {}", failure.playlist_name, failure.reason);
                    report.group_failures.push(failure);
                }
            }
        }

        Ok(report)
    }

    async fn import_group(&self, group: PlaylistGroup) -> Result<ImportResult, GroupFailure> {
        let PlaylistGroup { name, tracks } = group;
        log::info!("Processing playlist '{}' ({} tracks)", name, tracks.len());

        let playlist_id = materialize_playlist(&self.store, &name, self.options.mode)
            .await
            .map_err(|reason| GroupFailure {
                playlist_name: name.clone(),
                track_count: tracks.len(),
                reason,
            })?;

        let attempted = tracks.len();
        let resolver = Resolver::new(&self.search, &self.pacer);
        let mut failed = Vec::new();
        let mut deliverable = Vec::with_capacity(tracks.len());
        let mut video_ids = Vec::with_capacity(tracks.len());

        for mut track in tracks {
            if let Err(reason) = resolver.resolve(&mut track).await {
                log::warn!("  {} ({}): {}", track, track.source_row, reason);
                failed.push(TrackFailure { track, reason });
                continue;
            }
            if let Some(id) = track.target_id.clone() {
                video_ids.push(id);
                deliverable.push(track);
            }
        }

        let mut succeeded = 0;
        if !video_ids.is_empty() {
            log::info!("Adding {} tracks to '{}'", video_ids.len(), name);
            let engine = DeliveryEngine::new(&self.store, &self.pacer, &self.options.delivery);
            let outcomes = engine.deliver(&playlist_id, &video_ids).await;

            for (track, outcome) in deliverable.into_iter().zip(outcomes) {
                match outcome {
                    Ok(()) => succeeded += 1,
                    Err(reason) => failed.push(TrackFailure { track, reason }),
                }
            }
        }

        log::info!(
            "Playlist '{}': {}/{} tracks added",
            name,
            succeeded,
            attempted
        );

        Ok(ImportResult {
            playlist_name: name,
            playlist_id,
            attempted,
            succeeded,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use color_eyre::eyre::eyre;

    use super::*;
    use crate::ports::source::{MockSourceReader, RawRecord, RawSource, SourceRows};
    use crate::ports::ytmusic::{
        MockMusicSearch, MockPlaylistStore, RemoteError, RemotePlaylist, SearchCandidate,
    };

    fn options() -> ImportOptions {
        ImportOptions {
            mode: PlaylistMode::Append,
            delivery: DeliveryConfig {
                batch_size: 25,
                batch_delay_ms: 0,
                max_attempts: 2,
                backoff_base_ms: 1,
                backoff_max_ms: 2,
            },
            resolver: ResolverConfig { search_delay_ms: 0 },
        }
    }

    fn csv_source(name: &str, headers: &[&str], rows: &[&[&str]]) -> Box<dyn SourceReader> {
        let raw = RawSource {
            name: name.to_string(),
            rows: SourceRows::Csv {
                headers: headers.iter().map(|h| h.to_string()).collect(),
                records: rows
                    .iter()
                    .enumerate()
                    .map(|(i, fields)| RawRecord {
                        line: i + 1,
                        fields: fields.iter().map(|f| f.to_string()).collect(),
                    })
                    .collect(),
            },
        };
        let description = format!("{}.csv", name);
        let mut reader = MockSourceReader::new();
        reader.expect_describe().returning(move || description.clone());
        reader.expect_read().returning(move || Ok(raw.clone()));
        Box::new(reader)
    }

    fn candidate(video_id: &str) -> SearchCandidate {
        SearchCandidate {
            video_id: video_id.to_string(),
            title: String::new(),
            artist: None,
        }
    }

    #[tokio::test]
    async fn test_my_mix_end_to_end() {
        let mut search = MockMusicSearch::new();
        search
            .expect_search_songs()
            .withf(|q| q == "Song A Artist X")
            .times(1)
            .returning(|_| Ok(vec![candidate("aaaaaaaaaaa")]));
        search
            .expect_search_songs()
            .withf(|q| q == "Song B Artist Y")
            .times(1)
            .returning(|_| Ok(vec![candidate("bbbbbbbbbbb")]));

        let mut store = MockPlaylistStore::new();
        store.expect_list_playlists().returning(|| Ok(vec![]));
        store
            .expect_create_playlist()
            .withf(|name, _| name == "My Mix")
            .times(1)
            .returning(|_, _| Ok("PL1".to_string()));
        store
            .expect_add_tracks()
            .withf(|id, ids| id == "PL1" && ids == ["aaaaaaaaaaa", "bbbbbbbbbbb"])
            .times(1)
            .returning(|_, _| Ok(()));

        let service = ImportService::new(search, store, options());
        let sources = vec![csv_source(
            "My Mix",
            &["Title", "Artist"],
            &[&["Song A", "Artist X"], &["Song B", "Artist Y"]],
        )];

        let report = service.run(&sources).await.unwrap();

        assert_eq!(report.results.len(), 1);
        let result = &report.results[0];
        assert_eq!(result.playlist_name, "My Mix");
        assert_eq!(result.playlist_id, "PL1");
        assert_eq!(result.attempted, 2);
        assert_eq!(result.succeeded, 2);
        assert!(result.failed.is_empty());
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_append_rerun_reuses_playlist() {
        let library: Arc<Mutex<Vec<RemotePlaylist>>> = Arc::new(Mutex::new(Vec::new()));

        let mut store = MockPlaylistStore::new();
        let listed = library.clone();
        store
            .expect_list_playlists()
            .returning(move || Ok(listed.lock().unwrap().clone()));
        let created = library.clone();
        store
            .expect_create_playlist()
            .times(1)
            .returning(move |name, _| {
                created.lock().unwrap().push(RemotePlaylist {
                    id: "PL1".to_string(),
                    name: name.to_string(),
                });
                Ok("PL1".to_string())
            });
        store
            .expect_add_tracks()
            .withf(|id, _| id == "PL1")
            .times(2)
            .returning(|_, _| Ok(()));

        let service = ImportService::new(MockMusicSearch::new(), store, options());
        let sources = vec![csv_source(
            "My Mix",
            &["Title", "MediaId"],
            &[&["Song A", "aaaaaaaaaaa"]],
        )];

        let first = service.run(&sources).await.unwrap();
        let second = service.run(&sources).await.unwrap();

        assert_eq!(first.results[0].playlist_id, "PL1");
        assert_eq!(second.results[0].playlist_id, "PL1");
    }

    #[tokio::test]
    async fn test_group_failure_does_not_stop_run() {
        let mut store = MockPlaylistStore::new();
        store.expect_list_playlists().returning(|| Ok(vec![]));
        store
            .expect_create_playlist()
            .withf(|name, _| name == "Broken")
            .returning(|_, _| Err(RemoteError::with_status(400, "invalid title")));
        store
            .expect_create_playlist()
            .withf(|name, _| name == "Working")
            .returning(|_, _| Ok("PL2".to_string()));
        store
            .expect_add_tracks()
            .withf(|id, ids| id == "PL2" && ids == ["bbbbbbbbbbb"])
            .times(1)
            .returning(|_, _| Ok(()));

        let mut search = MockMusicSearch::new();
        search.expect_search_songs().never();

        let service = ImportService::new(search, store, options());
        let sources = vec![csv_source(
            "export",
            &["Title", "MediaId", "PlaylistName"],
            &[
                &["Song A", "aaaaaaaaaaa", "Broken"],
                &["Song B", "bbbbbbbbbbb", "Working"],
                &["Song C", "ccccccccccc", "Broken"],
            ],
        )];

        let report = service.run(&sources).await.unwrap();

        assert_eq!(report.group_failures.len(), 1);
        assert_eq!(report.group_failures[0].playlist_name, "Broken");
        assert_eq!(report.group_failures[0].track_count, 2);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].playlist_name, "Working");
        assert_eq!(report.total_attempted(), 1);
    }

    #[tokio::test]
    async fn test_unresolved_track_is_reported_not_delivered() {
        let mut search = MockMusicSearch::new();
        search.expect_search_songs().returning(|_| Ok(vec![]));

        let mut store = MockPlaylistStore::new();
        store.expect_list_playlists().returning(|| Ok(vec![]));
        store
            .expect_create_playlist()
            .returning(|_, _| Ok("PL1".to_string()));
        store
            .expect_add_tracks()
            .withf(|_, ids| ids == ["aaaaaaaaaaa"])
            .times(1)
            .returning(|_, _| Ok(()));

        let service = ImportService::new(search, store, options());
        let sources = vec![csv_source(
            "Mixed",
            &["Title", "MediaId"],
            &[&["Known", "aaaaaaaaaaa"], &["Obscure", ""]],
        )];

        let report = service.run(&sources).await.unwrap();
        let result = &report.results[0];

        assert_eq!(result.attempted, 2);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(
            result.failed[0].reason,
            ImportError::NotFound {
                query: "Obscure".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_sources_is_precondition_failure() {
        let mut store = MockPlaylistStore::new();
        store.expect_list_playlists().never();
        let service = ImportService::new(MockMusicSearch::new(), store, options());

        let err = service.run(&[]).await.unwrap_err();
        assert!(matches!(err, ImportError::Precondition { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_and_unrecognized_sources_are_recorded() {
        let mut missing = MockSourceReader::new();
        missing
            .expect_describe()
            .returning(|| "missing.csv".to_string());
        missing
            .expect_read()
            .returning(|| Err(eyre!("No such file or directory")));

        let mut store = MockPlaylistStore::new();
        store.expect_list_playlists().returning(|| Ok(vec![]));
        store
            .expect_create_playlist()
            .times(1)
            .returning(|_, _| Ok("PL1".to_string()));
        store.expect_add_tracks().returning(|_, _| Ok(()));

        let service = ImportService::new(MockMusicSearch::new(), store, options());
        let sources: Vec<Box<dyn SourceReader>> = vec![
            Box::new(missing),
            csv_source("weird", &["foo", "bar"], &[&["1", "2"]]),
            csv_source("good", &["MediaId"], &[&["aaaaaaaaaaa"]]),
        ];

        let report = service.run(&sources).await.unwrap();

        let failed_sources: Vec<_> = report
            .source_failures
            .iter()
            .map(|f| f.source.as_str())
            .collect();
        assert_eq!(failed_sources, ["missing.csv", "weird"]);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].succeeded, 1);
    }
}

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use color_eyre::eyre::{Context, Result, eyre};
use regex::Regex;

use crate::ports::ytmusic::{PlaylistStore, RemotePlaylist, RemoteTrack};

const MAX_FILENAME_CHARS: usize = 240;
const FALLBACK_FILENAME: &str = "playlist";

fn forbidden_chars() -> &'static Regex {
    static FORBIDDEN: OnceLock<Regex> = OnceLock::new();
    FORBIDDEN.get_or_init(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("valid pattern"))
}

fn whitespace_runs() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid pattern"))
}

/// Turn a playlist title into a file name stem that is valid on common filesystems.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = forbidden_chars().replace_all(name.trim(), "");
    let collapsed = whitespace_runs().replace_all(&cleaned, " ");
    let truncated: String = collapsed.trim().chars().take(MAX_FILENAME_CHARS).collect();

    if truncated.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        truncated
    }
}

/// Write tracks in the `Title,Artists,MediaId` layout the importer reads back as ids.
fn write_csv(path: &Path, tracks: &[RemoteTrack]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .wrap_err_with(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(["Title", "Artists", "MediaId"])?;
    for track in tracks {
        writer.write_record([
            track.title.as_str(),
            track.artists.join(", ").as_str(),
            track.video_id.as_deref().unwrap_or(""),
        ])?;
    }
    writer
        .flush()
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Playlists whose title matches `name` case-insensitively: exact matches if there are
/// any, substring matches otherwise.
fn find_matches<'a>(playlists: &'a [RemotePlaylist], name: &str) -> Vec<&'a RemotePlaylist> {
    let target = name.trim().to_lowercase();
    let exact: Vec<_> = playlists
        .iter()
        .filter(|p| p.name.trim().to_lowercase() == target)
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    playlists
        .iter()
        .filter(|p| p.name.trim().to_lowercase().contains(&target))
        .collect()
}

#[derive(Debug, Default)]
pub struct ExportSummary {
    pub exported: Vec<(String, PathBuf)>,
    pub skipped: Vec<(String, String)>,
    pub total: usize,
}

/// Writes remote playlists to CSV files.
pub struct ExportService<P: PlaylistStore> {
    store: P,
}

impl<P: PlaylistStore> ExportService<P> {
    pub fn new(store: P) -> Self {
        Self { store }
    }

    async fn export_playlist(
        &self,
        playlist: &RemotePlaylist,
        out_dir: &Path,
        used_names: &mut HashSet<String>,
    ) -> Result<PathBuf> {
        let tracks = self
            .store
            .playlist_tracks(&playlist.id)
            .await
            .wrap_err_with(|| format!("Failed to fetch playlist '{}'", playlist.name))?;

        let stem = sanitize_filename(&playlist.name);
        let mut file_name = format!("{}.csv", stem);
        let mut n = 2;
        while !used_names.insert(file_name.to_lowercase()) {
            file_name = format!("{} ({}).csv", stem, n);
            n += 1;
        }

        let path = out_dir.join(file_name);
        write_csv(&path, &tracks)?;
        log::debug!("Wrote {} tracks to {}", tracks.len(), path.display());
        Ok(path)
    }

    async fn library(&self, out_dir: &Path) -> Result<Vec<RemotePlaylist>> {
        let playlists = self
            .store
            .list_playlists()
            .await
            .wrap_err("Failed to list playlists")?;
        std::fs::create_dir_all(out_dir)
            .wrap_err_with(|| format!("Failed to create {}", out_dir.display()))?;
        Ok(playlists)
    }

    /// Export the best match for `name`. When several playlists match, the first one wins.
    pub async fn export_by_name(&self, name: &str, out_dir: &Path) -> Result<PathBuf> {
        let playlists = self.library(out_dir).await?;
        let matches = find_matches(&playlists, name);

        let playlist = matches
            .first()
            .ok_or(eyre!("Playlist not found: {}", name))?;
        if matches.len() > 1 {
            log::warn!(
                "{} playlists match '{}', exporting the first: '{}'",
                matches.len(),
                name,
                playlist.name
            );
        }

        let path = self
            .export_playlist(playlist, out_dir, &mut HashSet::new())
            .await?;
        log::info!("Exported '{}' -> {}", playlist.name, path.display());
        Ok(path)
    }

    /// Export every library playlist. Playlists that fail to export are skipped and
    /// reported in the summary.
    pub async fn export_all(&self, out_dir: &Path) -> Result<ExportSummary> {
        let playlists = self.library(out_dir).await?;
        let mut summary = ExportSummary {
            total: playlists.len(),
            ..Default::default()
        };
        let mut used_names = HashSet::new();

        for playlist in &playlists {
            match self.export_playlist(playlist, out_dir, &mut used_names).await {
                Ok(path) => {
                    log::info!("Exported '{}' -> {}", playlist.name, path.display());
                    summary.exported.push((playlist.name.clone(), path));
                }
                Err(e) => {
                    log::warn!("Skipped '{}': {:#}", playlist.name, e);
                    summary
                        .skipped
                        .push((playlist.name.clone(), format!("{:#}", e)));
                }
            }
        }

        Ok(summary)
    }
}

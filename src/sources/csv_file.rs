use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use walkdir::WalkDir;

use crate::ports::source::{RawRecord, RawSource, SourceReader, SourceRows};

/// Reads one CSV file. The file stem doubles as the default playlist name.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Parse CSV bytes into a header and numbered records.
///
/// Rows may have differing lengths and invalid UTF-8 is replaced rather than rejected;
/// the normalizer decides what is usable.
fn parse_csv(bytes: &[u8]) -> Result<(Vec<String>, Vec<RawRecord>)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(bytes);

    let headers = reader
        .byte_headers()
        .wrap_err("Failed to read CSV header")?
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let field = String::from_utf8_lossy(field);
            // Spreadsheet exports often start with a byte order mark
            if i == 0 {
                field.trim_start_matches('\u{feff}').to_string()
            } else {
                field.to_string()
            }
        })
        .collect();

    let mut records = Vec::new();
    for (index, record) in reader.byte_records().enumerate() {
        let record = record.wrap_err_with(|| format!("Failed to read CSV record {}", index + 1))?;
        records.push(RawRecord {
            line: index + 1,
            fields: record
                .iter()
                .map(|field| String::from_utf8_lossy(field).to_string())
                .collect(),
        });
    }

    Ok((headers, records))
}

#[async_trait::async_trait]
impl SourceReader for CsvFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn read(&self) -> Result<RawSource> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .wrap_err_with(|| format!("Failed to read {}", self.path.display()))?;
        let (headers, records) =
            parse_csv(&bytes).wrap_err_with(|| format!("Failed to parse {}", self.path.display()))?;

        log::debug!(
            "Read {} records from {}",
            records.len(),
            self.path.display()
        );

        Ok(RawSource {
            name: self.name(),
            rows: SourceRows::Csv { headers, records },
        })
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn is_pattern(input: &Path) -> bool {
    input
        .to_str()
        .is_some_and(|s| s.contains(['*', '?', '[']))
}

/// Files matching a glob pattern, in name order. `None` when the pattern is invalid.
fn glob_matches(pattern: &str) -> Option<Vec<PathBuf>> {
    let paths = match glob::glob(pattern) {
        Ok(paths) => paths,
        Err(e) => {
            log::debug!("'{}' is not a valid pattern: {}", pattern, e);
            return None;
        }
    };

    let mut matches: Vec<PathBuf> = paths
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    matches.sort();
    Some(matches)
}

/// Expand the command-line inputs into CSV files.
///
/// Directories contribute their top-level `*.csv` files in name order and glob patterns
/// the files they match. Other paths are kept as given, so a missing file surfaces as a
/// read failure for that source.
pub fn expand_csv_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.exists() && is_pattern(input) {
            if let Some(matches) = input.to_str().and_then(glob_matches) {
                if matches.is_empty() {
                    log::warn!("No files match {}", input.display());
                }
                files.extend(matches);
                continue;
            }
        }

        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let before = files.len();
        files.extend(
            WalkDir::new(input)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file() && is_csv(entry.path()))
                .map(|entry| entry.into_path()),
        );

        if files.len() == before {
            log::warn!("No CSV files found in {}", input.display());
        }
    }

    files
}

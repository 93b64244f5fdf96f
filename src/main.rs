mod config;
mod logging;
mod ports;
mod services;
mod sources;
mod spotify_rs;
mod ytmusic_rs;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};

use crate::{
    config::Config,
    logging::setup_logging,
    ports::source::SourceReader,
    services::{
        export::ExportService,
        import::{
            ImportOptions, ImportService,
            materialize::PlaylistMode,
            types::{ImportError, ImportReport},
        },
        spotify::client::SpotifyHttpAdapter,
        ytmusic::client::YtMusicHttpAdapter,
    },
    sources::{CsvFileSource, SpotifyPlaylistSource, expand_csv_inputs, parse_playlist_id},
    ytmusic_rs::BrowserCredentials,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "PLAYLIST_IMPORTER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Console log level
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "PLAYLIST_IMPORTER_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import CSV files and/or a Spotify playlist into YouTube Music
    Import {
        /// CSV files or directories containing CSV files
        files: Vec<PathBuf>,

        /// Spotify playlist URL, URI or id to import
        #[arg(long)]
        spotify: Option<String>,

        /// Always create new playlists instead of appending to existing ones
        #[arg(long)]
        replace: bool,

        /// Browser credential file (default: from config)
        #[arg(long, env = "PLAYLIST_IMPORTER_CREDENTIALS")]
        credentials: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export YouTube Music playlists to CSV files
    Export {
        /// Export the playlist matching this name
        #[arg(long, required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,

        /// Export every playlist in the library
        #[arg(long)]
        all: bool,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Browser credential file (default: from config)
        #[arg(long, env = "PLAYLIST_IMPORTER_CREDENTIALS")]
        credentials: Option<PathBuf>,
    },
    /// Create the credential file from request headers pasted on stdin
    Setup {
        /// Where to write the credential file (default: from config)
        #[arg(long, env = "PLAYLIST_IMPORTER_CREDENTIALS")]
        credentials: Option<PathBuf>,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

/// Load browser credentials. Problems here stop the run before any request is made.
fn load_credentials(path: &Path) -> Result<BrowserCredentials> {
    BrowserCredentials::from_file(path)
        .map_err(|e| ImportError::Precondition {
            reason: e.to_string(),
        })
        .wrap_err("Cannot talk to YouTube Music")
}

fn print_report(report: &ImportReport) {
    println!();
    println!("Import summary");
    for result in &report.results {
        println!(
            "  {} ({}): {}/{} added",
            result.playlist_name, result.playlist_id, result.succeeded, result.attempted
        );
        for failure in &result.failed {
            println!(
                "    - {} [{}]: {}",
                failure.track, failure.track.source_row, failure.reason
            );
        }
    }
    for failure in &report.group_failures {
        println!(
            "  {} skipped ({} tracks): {}",
            failure.playlist_name, failure.track_count, failure.reason
        );
    }
    if !report.row_failures.is_empty() {
        println!("  Skipped rows:");
        for failure in &report.row_failures {
            println!("    - {}: {}", failure.row, failure.reason);
        }
    }
    if !report.source_failures.is_empty() {
        println!("  Unusable sources:");
        for failure in &report.source_failures {
            println!("    - {}: {}", failure.source, failure.reason);
        }
    }
    println!(
        "Playlists: {}, tracks attempted: {}, added: {}, failed: {}",
        report.playlists_processed(),
        report.total_attempted(),
        report.total_succeeded(),
        report.total_failed()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Playlist importer starting");
    log::debug!("Loading configuration");

    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load playlist-importer config")?;

    match args.command {
        Commands::Import {
            files,
            spotify,
            replace,
            credentials,
            json,
        } => {
            let credentials_path = credentials.unwrap_or_else(|| config.credentials_path());
            let adapter = YtMusicHttpAdapter::new(load_credentials(&credentials_path)?);

            let mut sources: Vec<Box<dyn SourceReader>> = expand_csv_inputs(&files)
                .into_iter()
                .map(|path| Box::new(CsvFileSource::new(path)) as Box<dyn SourceReader>)
                .collect();

            if let Some(input) = spotify {
                let playlist_id = parse_playlist_id(&input)?;
                let spotify_config = config.spotify_config().ok_or(eyre!(
                    "Spotify credentials missing: set [spotify] in the config or SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET"
                ))?;
                let client = SpotifyHttpAdapter::connect(&spotify_config).await?;
                sources.push(Box::new(SpotifyPlaylistSource::new(client, playlist_id)));
            }

            let options = ImportOptions {
                mode: if replace {
                    PlaylistMode::Replace
                } else {
                    PlaylistMode::Append
                },
                delivery: config.delivery.clone(),
                resolver: config.resolver.clone(),
            };
            log::debug!("Starting import of {} sources ({:?})", sources.len(), options.mode);

            let service = ImportService::new(adapter.clone(), adapter, options);
            let report = service.run(&sources).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }

            if report.has_failures() {
                std::process::exit(1);
            }
        }
        Commands::Export {
            name,
            all,
            out,
            credentials,
        } => {
            let credentials_path = credentials.unwrap_or_else(|| config.credentials_path());
            let service =
                ExportService::new(YtMusicHttpAdapter::new(load_credentials(&credentials_path)?));

            match name {
                Some(name) if !all => {
                    let path = service.export_by_name(&name, &out).await?;
                    println!("Exported '{}' -> {}", name, path.display());
                }
                _ => {
                    let summary = service.export_all(&out).await?;
                    for (title, path) in &summary.exported {
                        println!("  + {} -> {}", title, path.display());
                    }
                    for (title, reason) in &summary.skipped {
                        println!("  - {} skipped: {}", title, reason);
                    }
                    println!(
                        "Exported {}/{} playlists to {}",
                        summary.exported.len(),
                        summary.total,
                        out.display()
                    );
                }
            }
        }
        Commands::Setup { credentials } => {
            let credentials_path = credentials.unwrap_or_else(|| config.credentials_path());
            eprintln!("Open music.youtube.com while logged in, open the developer tools network tab,");
            eprintln!("copy the request headers of a POST to /youtubei/v1/browse and paste them here.");
            eprintln!("Finish with Ctrl+D.");

            let raw = std::io::read_to_string(std::io::stdin())
                .wrap_err("Failed to read headers from stdin")?;
            let parsed = BrowserCredentials::parse_request_headers(&raw)?;
            parsed.save(&credentials_path)?;
            println!("Credentials saved to {}", credentials_path.display());
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }

    Ok(())
}

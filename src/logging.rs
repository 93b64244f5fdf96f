use std::path::PathBuf;

use color_eyre::Result;
use color_eyre::eyre::Context;
use fern::colors::{Color, ColoredLevelConfig};

/// Route `log` records to stderr and, optionally, to a log file.
///
/// Each output has its own level so a run can stay quiet on the console while the
/// file keeps the full request trace.
pub fn setup_logging(
    console_level: log::LevelFilter,
    log_file: Option<PathBuf>,
    file_level: log::LevelFilter,
) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    let console = fern::Dispatch::new()
        .level(console_level)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} {:<5} {}",
                chrono::Local::now().format("%H:%M:%S"),
                colors.color(record.level()),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = fern::Dispatch::new()
        // Dependencies (reqwest, hyper, governor) are noisy below info
        .level(log::LevelFilter::Info)
        .level_for(env!("CARGO_CRATE_NAME"), log::LevelFilter::Trace)
        .chain(console);

    if let Some(path) = log_file {
        let file = fern::log_file(&path)
            .wrap_err_with(|| format!("Failed to open log file: {}", path.display()))?;
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .level(file_level)
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{} {:<5} [{}] {}",
                        chrono::Local::now().to_rfc3339(),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(file),
        );
    }

    dispatch
        .apply()
        .wrap_err("Failed to install logger")?;

    Ok(())
}

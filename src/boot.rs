use chrono::Local;
use log::LevelFilter;
use std::io::{self, Write};

use env_logger::{Builder, Target};

use crate::core::config::LogSettings;

pub const LOG_FILE_ENV: &str = "OVERLAYKIT_LOG_FILE";

/// Logger setup shared by the terminal UI and headless runs.
///
/// The terminal UI owns stdout, so a file is used whenever one is
/// configured: `OVERLAYKIT_LOG_FILE`, then `[log] file`, then
/// `./overlaykit.log` in debug builds.
pub fn init_common(settings: &LogSettings) {
    let log_file = std::env::var(LOG_FILE_ENV)
        .ok()
        .or_else(|| settings.file.clone())
        .or_else(|| {
            #[cfg(debug_assertions)]
            {
                Some("./overlaykit.log".to_string())
            }
            #[cfg(not(debug_assertions))]
            {
                None
            }
        });

    let level = settings
        .level
        .as_deref()
        .and_then(|level| level.parse::<LevelFilter>().ok());

    if let Some(path) = log_file {
        if let Err(err) = init_file_logger(&path, level.unwrap_or(LevelFilter::Debug)) {
            eprintln!("Failed to initialize file logger at '{path}': {err}");
            env_logger::init();
        }
    } else if let Some(level) = level {
        Builder::new().filter_level(level).parse_default_env().init();
    } else {
        env_logger::init();
    }
}

fn init_file_logger(path: &str, level: LevelFilter) -> io::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{} {} [{}] - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(file)))
        .filter_level(level)
        .parse_default_env()
        .init();

    log::info!("File logger initialized at {path}");

    Ok(())
}

//! Logging setup.
//!
//! Compact console output plus JSON-formatted daily-rolling file logs.

use std::fs;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system. Returns the file-appender guard, which
/// must stay alive for the lifetime of the process or buffered file logs
/// are dropped.
pub fn init_logger(
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    fs::create_dir_all("logs")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .compact();

    let file_appender = tracing_appender::rolling::daily("logs", "roundtrip-bot.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .json()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logger initialized");
    Ok(guard)
}

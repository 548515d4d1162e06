use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Settings;

pub const LOG_FILE: &str = "fintracker.log";

/// Initialize tracing into a daily rolling file under the data directory.
///
/// - The terminal belongs to the UI, so nothing is written to stdout
/// - Default level comes from `log_level`, override via RUST_LOG env
/// - Keep the returned guard alive until exit or buffered lines are lost
pub fn init(settings: &Settings) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(&settings.data_dir)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,fintracker={}", settings.log_level)));

    let appender = tracing_appender::rolling::daily(&settings.data_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init();

    tracing::debug!("Tracing initialized");
    Ok(guard)
}

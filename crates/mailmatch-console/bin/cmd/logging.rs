use mailmatch_console::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "mailmatch-console.log";

// RUST_LOG > --log-level > config file > "info"
fn filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mailmatch_console={}", config.level)))
}

/// Logs to stderr, for headless commands.
pub(crate) fn init_stderr(config: &LoggingConfig) {
    tracing_subscriber::registry()
        .with(filter(config))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Logs to a daily rotated file, for commands that own the terminal.
///
/// The guard must live until exit so buffered lines get flushed.
pub(crate) fn init_file(config: &LoggingConfig) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(&config.dir) {
        eprintln!(
            "Warning: could not create log directory {}: {}. Logging disabled.",
            config.dir.display(),
            e
        );
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&config.dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter(config))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();
    Some(guard)
}

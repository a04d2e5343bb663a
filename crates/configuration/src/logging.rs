use crate::error::ConfigError;
use crate::settings::{LogFormat, LoggingSettings};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "value-lab.log";

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. When a log directory is
/// configured, output goes to a daily rolling file through a non-blocking
/// writer; the returned guard must be kept alive until the program exits so
/// buffered lines are flushed.
pub fn init_tracing(settings: &LoggingSettings) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| {
            ConfigError::LoggingError(format!("invalid log level '{}': {e}", settings.level))
        })?;

    let (writer, guard) = match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(settings.directory.is_none());

    let installed = match settings.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed.map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    Ok(guard)
}

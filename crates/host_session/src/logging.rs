//! Logging bootstrap and level-configurable routine messages.

use std::fs;
use std::path::Path;

use tracing_subscriber::{
    Layer, filter::LevelFilter, filter::filter_fn, fmt, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::LogLevel;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Must be kept alive for as long as logging is needed; dropping it flushes
/// the file writer.
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Installs the global subscriber: a non-blocking file layer writing
/// `<dir>/<file_name>` plus a console layer, both filtered to `level`.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(dir: &Path, file_name: &str, level: LevelFilter) -> Result<LogGuard, BoxError> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::Layer::default()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(filter_fn(move |metadata| metadata.level() <= &level));

    let console_layer = fmt::Layer::default()
        .with_target(false)
        .with_filter(filter_fn(move |metadata| metadata.level() <= &level));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(LogGuard { _guard: guard })
}

/// Emits a routine lifecycle message at the configured level.
pub(crate) fn routine(level: LogLevel, message: &str) {
    match level {
        LogLevel::Trace => tracing::trace!("{message}"),
        LogLevel::Debug => tracing::debug!("{message}"),
        LogLevel::Info => tracing::info!("{message}"),
        LogLevel::Warn => tracing::warn!("{message}"),
        LogLevel::Error => tracing::error!("{message}"),
    }
}

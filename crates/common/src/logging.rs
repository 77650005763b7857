//! Logging and tracing initialization.

use serde::{Deserialize, Serialize};

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

/// Severity accepted by [`log_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

/// Fire-and-forget event log for the presentation layer.
///
/// Never fails and never blocks; a category of `None` is recorded as `"ui"`.
pub fn log_event(message: &str, level: LogLevel, category: Option<&str>) {
    let category = category.unwrap_or("ui");
    match level {
        LogLevel::Debug => tracing::debug!(category, "{message}"),
        LogLevel::Info => tracing::info!(category, "{message}"),
        LogLevel::Warning => tracing::warn!(category, "{message}"),
        LogLevel::Error => tracing::error!(category, "{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_without_subscriber_is_noop() {
        log_event("export started", LogLevel::Info, Some("VideoExport"));
        log_event("no category", LogLevel::Error, None);
    }
}

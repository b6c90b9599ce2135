use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::LoggingConfiguration;
use crate::error::AppError;

/// Installs the global subscriber: human readable output on stdout, plus a
/// plain-text copy in the configured log file.
pub fn init_logging(configuration: &LoggingConfiguration) -> Result<(), AppError> {
    let level = configuration.level_filter()?;

    let file_layer = match &configuration.file {
        Some(path) => {
            let file = File::create(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(level),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(level))
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Configuration(format!("Failed to install logger: {}", e)))
}

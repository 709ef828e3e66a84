//! Logging initialisation

use stratonea_core::{StratoneaError, StratoneaResult};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{LogConfig, LogFormat};

/// Install the global `tracing` subscriber.
///
/// Can succeed once per process; later calls return
/// `LoggingAlreadyInitialised`.
pub fn init(config: &LogConfig) -> StratoneaResult<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| StratoneaError::Config(format!("log filter {:?}: {}", config.filter, e)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(config.with_file_and_line)
                    .with_line_number(config.with_file_and_line),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_file(config.with_file_and_line)
                    .with_line_number(config.with_file_and_line),
            )
            .try_init(),
    };

    result.map_err(|_| StratoneaError::LoggingAlreadyInitialised)?;
    tracing::debug!(filter = %config.filter, format = ?config.format, "logging initialised");
    Ok(())
}

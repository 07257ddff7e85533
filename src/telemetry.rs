//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt};

use classhub_core::config::logging::LoggingConfig;

/// Initializes the global tracing subscriber.
///
/// The `RUST_LOG` environment variable wins over the configured level.
/// The subscriber can only be installed once per process; a second call
/// panics.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

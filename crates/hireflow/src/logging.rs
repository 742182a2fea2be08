//! Logging initialisation.
//!
//! Installs a `tracing` subscriber once per process. Records emitted through
//! the `log` facade (the database layer) are bridged into it.

use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

static INIT: Once = Once::new();

/// Initializes logging from config. `RUST_LOG` overrides the configured level.
///
/// Safe to call multiple times; only the first call has an effect. Returns
/// whether this call installed the subscriber.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let mut installed = false;
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let result = match config.format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .try_init(),
        };
        // Another subscriber may already be set by the host application
        installed = result.is_ok();
    });
    installed
}

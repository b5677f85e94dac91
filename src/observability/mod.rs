//! # Observability Infrastructure
//!
//! Structured logging for the Watson registry. Spans come from the
//! `#[instrument]` attributes on services and repositories, the
//! [`request_span!`](crate::request_span) macro used by the HTTP trace
//! layer, and [`db_span!`](crate::db_span) around migrations.

pub mod logging;

pub use logging::log_config_info;

use crate::config::ObservabilityConfig;
use crate::errors::{Result, WatsonError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Fails if the filter
/// does not parse or a global subscriber is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| {
            WatsonError::config_with_source(
                format!("Invalid log level '{}'", config.log_level),
                Box::new(e),
            )
        })?;

    let json_layer =
        config.json_logging.then(|| fmt::layer().json().with_current_span(true).with_target(false));
    let text_layer = (!config.json_logging).then(fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| WatsonError::config_with_source("Failed to install logger", Box::new(e)))?;

    tracing::debug!(
        log_level = %config.log_level,
        json = config.json_logging,
        "Logging initialized"
    );

    Ok(())
}

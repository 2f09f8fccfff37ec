//! Tracing subscriber setup.
//!
//! `log` records emitted by the persistence layer are bridged into `tracing`
//! so both end up in the same output.

use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::TelemetryError;

/// Builds the filter from `RUST_LOG` when set, otherwise from `level`.
pub fn build_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    let directives = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => level.to_string(),
    };
    EnvFilter::try_new(&directives).map_err(|e| TelemetryError::Filter {
        filter: directives.clone(),
        reason: e.to_string(),
    })
}

/// Installs the global subscriber described by the `logging` config section.
pub fn init_from_config(logging: &LoggingConfig) -> Result<(), TelemetryError> {
    init_tracing(&logging.level, logging.json)
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_tracing(level: &str, json: bool) -> Result<(), TelemetryError> {
    let filter = build_filter(level)?;
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        install(registry.with(fmt::layer().json().with_current_span(true)))
    } else {
        install(registry.with(fmt::layer().with_target(false)))
    }
}

fn install<S>(subscriber: S) -> Result<(), TelemetryError>
where
    S: Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| TelemetryError::Install(e.to_string()))?;
    tracing_log::LogTracer::init().map_err(|e| TelemetryError::Install(e.to_string()))?;
    tracing::debug!("Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
            return;
        }
        let err = build_filter("otboard=loud").unwrap_err();
        assert!(matches!(err, TelemetryError::Filter { .. }));
    }

    #[test]
    fn test_valid_filter() {
        assert!(build_filter("info,otboard=debug").is_ok());
    }

    #[test]
    fn test_second_install_fails() {
        let _ = init_tracing("warn", false);
        assert!(init_tracing("warn", true).is_err());
    }
}

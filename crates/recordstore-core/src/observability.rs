//! Tracing subscriber setup driven by [`LoggingConfig`].
//!
//! The filter sits behind a reload layer so the level can be changed after
//! start-up with [`reload_logging`] or [`apply_logging_level`].

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

fn initial_filter(config: &LoggingConfig) -> EnvFilter {
    if config.respect_env
        && std::env::var_os(EnvFilter::DEFAULT_ENV).is_some()
        && let Ok(filter) = EnvFilter::try_from_default_env()
    {
        return filter;
    }
    EnvFilter::new(&config.level)
}

/// Installs the global subscriber described by `config`.
///
/// Returns `false` if a global subscriber was already installed; the existing
/// one is left untouched.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let (filter, handle) = reload::Layer::new(initial_filter(config));
    let output = fmt::layer()
        .with_ansi(config.ansi)
        .with_target(config.with_target);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .is_ok();

    if installed {
        let _ = FILTER_HANDLE.set(handle);
        tracing::debug!(level = %config.level, "Tracing initialized");
    }
    installed
}

/// [`init_tracing`] with default settings and the given level.
pub fn init_tracing_with_level(level: &str) -> bool {
    init_tracing(&LoggingConfig {
        level: level.to_string(),
        ..LoggingConfig::default()
    })
}

/// Re-applies the level from a (re)loaded config.
pub fn reload_logging(config: &LoggingConfig) -> bool {
    apply_logging_level(&config.level)
}

/// Swaps the active filter. Returns `false` if this module did not install
/// the subscriber or `level` is not a valid filter directive.
pub fn apply_logging_level(level: &str) -> bool {
    let Some(handle) = FILTER_HANDLE.get() else {
        return false;
    };
    match EnvFilter::try_new(level) {
        Ok(filter) => handle.reload(filter).is_ok(),
        Err(e) => {
            tracing::warn!(level, error = %e, "Ignoring invalid log level");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_once_then_reload() {
        let config = LoggingConfig {
            level: "info".into(),
            respect_env: false,
            ansi: false,
            with_target: false,
        };
        let installed = init_tracing(&config);

        // A second install never replaces the first.
        assert!(!init_tracing_with_level("debug"));

        if installed {
            assert!(apply_logging_level("warn"));
            assert!(reload_logging(&config));
        } else {
            assert!(!apply_logging_level("warn"));
        }
        tracing::info!(component = "observability", "tracing initialized");
    }
}

//! Tracing initialization, shared by the binary and every crate's tests.

use crate::error::{CcboxError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber with environment-based configuration.
///
/// Uses the standard `RUST_LOG` environment variable for filtering:
/// - `RUST_LOG=debug` sets the global level
/// - `RUST_LOG=ccbox_build=debug,ccbox_detector=info` sets per-crate levels
///
/// Uses `RUST_LOG_FORMAT` for output format (optional): `json`, `compact`,
/// or the default `pretty`.
pub fn init() -> Result<()> {
    init_with_defaults("info")
}

pub fn init_with_defaults(default_filter: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let init_err = |e: tracing_subscriber::util::TryInitError| {
        CcboxError::Internal(format!("failed to initialize tracing: {e}"))
    };

    match format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_ansi(false).json())
            .try_init()
            .map_err(init_err)?,
        "compact" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().compact())
            .try_init()
            .map_err(init_err)?,
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .try_init()
            .map_err(init_err)?,
    }

    Ok(())
}

#[cfg(test)]
pub fn init_for_testing() -> Result<()> {
    let env_filter = EnvFilter::new("debug");
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_test_writer())
        .try_init()
        .map_err(|e| CcboxError::Internal(format!("failed to initialize test tracing: {e}")))
}

#[macro_export]
macro_rules! span_with_fields {
    ($level:expr, $name:expr, $($field:tt)*) => {
        tracing::span!($level, $name, $($field)*)
    };
}

pub fn current_span() -> tracing::Span {
    tracing::Span::current()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, error, info, info_span, warn, Level};

    #[test]
    fn initializes_and_accepts_events() {
        if init_for_testing().is_ok() {
            info!("test info message");
            debug!("test debug message");
            warn!("test warning message");
            error!("test error message");

            let span = info_span!("test_operation", id = 42);
            let _enter = span.enter();
            info!("message within span");
        }
    }

    #[test]
    fn span_with_fields_compiles_and_enters() {
        let span = span_with_fields!(Level::INFO, "test", project = "demo", stage = "stack");
        let _enter = span.enter();
    }
}

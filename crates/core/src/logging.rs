//! Logging initialization.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default directives used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,fractal=debug";

/// Initialize the tracing subscriber.
///
/// Filtering follows `RUST_LOG` and falls back to [`DEFAULT_FILTER`].
///
/// # Example
/// ```no_run
/// fractal_core::init_logging();
/// tracing::info!("Explorer starting");
/// ```
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}

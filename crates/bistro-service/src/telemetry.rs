//! Tracing setup.

use tracing_subscriber::EnvFilter;

use crate::config::DEFAULT_LOG_FILTER;

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `filter`; an empty `filter` falls back to
/// `info,bistro=debug,sqlx=warn`. Calling this twice is harmless: the
/// second call keeps the first subscriber.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| configured_filter(filter));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn configured_filter(filter: &str) -> EnvFilter {
    if filter.trim().is_empty() {
        EnvFilter::new(DEFAULT_LOG_FILTER)
    } else {
        EnvFilter::new(filter)
    }
}

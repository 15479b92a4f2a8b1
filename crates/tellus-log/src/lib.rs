//! Structured logging via the `tracing` ecosystem.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Console output with module paths and thread names (the background
/// build lanes are named per level, which makes split traces readable).
/// `RUST_LOG` overrides `default_filter` when set.
///
/// Calling this twice panics, like any global subscriber installation;
/// call it once at startup.
pub fn init_logging(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

/// The filter used when neither the caller nor `RUST_LOG` says otherwise.
#[must_use]
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info")
}

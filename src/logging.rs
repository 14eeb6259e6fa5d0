//! Diagnostic logging via `tracing`.

use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber, writing compact output to stderr.
///
/// `RUST_LOG` takes precedence over `level` when set. Subsequent calls are no-ops.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    // try_init fails only if a subscriber is already installed
    let _ = subscriber.try_init();
}

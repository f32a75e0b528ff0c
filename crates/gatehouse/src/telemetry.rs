//! Logging setup for binaries embedding Gatehouse.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing-subscriber` formatter filtered by `RUST_LOG`,
/// falling back to `info` when it is unset or unparseable.
///
/// Calling it again after a subscriber is installed does nothing.
///
/// ```ignore
/// gatehouse::init_tracing();
/// tracing::info!("started");
/// ```
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

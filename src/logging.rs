use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the tracing subscriber.
///
/// # Environment Variables
/// - `RUST_LOG`: log level filter (default: info),
///   e.g. `RUST_LOG=debug` or `RUST_LOG=shipping_connector=trace`
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}

/// Subscriber for tests; safe to call more than once.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

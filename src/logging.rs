use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber that writes to stderr.
///
/// stdout carries the framed protocol, so nothing may log there. The filter
/// comes from `RUST_LOG` and defaults to `info`. Calling this twice is a no-op.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

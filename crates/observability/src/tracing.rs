//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Initialize tracing/logging with [`DEFAULT_FILTER`].
pub fn init() {
    init_with_default(DEFAULT_FILTER);
}

/// Initialize tracing/logging for the process.
///
/// JSON lines with timestamps, written to stderr so they never interleave with output
/// rendered on stdout. `RUST_LOG` wins when set; otherwise each binary supplies its
/// own `default_filter`.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_with_default(default_filter: &str) {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = resolve_filter(from_env.as_deref(), default_filter);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Blank or unparseable directives fall back to `default_filter`.
fn resolve_filter(from_env: Option<&str>, default_filter: &str) -> EnvFilter {
    from_env
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter))
}

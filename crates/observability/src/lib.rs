//! Tracing/logging setup shared by every binary in the workspace.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Like [`init`], with a binary-specific filter used when `RUST_LOG` is unset.
pub fn init_with_default(default_filter: &str) {
    tracing::init_with_default(default_filter);
}

/// Tracing configuration (filters, layers).
pub mod tracing;

//! Subscriber setup for the kernel's `tracing` output.
//!
//! The library only emits events; installing a subscriber is left to the
//! binary (or a test) through [`init`].

use tracing_subscriber::{fmt, EnvFilter};

/// Install a formatted subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

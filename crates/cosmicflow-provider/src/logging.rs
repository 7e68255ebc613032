//! Log setup
//!
//! stdout belongs to the host runtime, so everything goes to stderr.

use tracing_subscriber::EnvFilter;

/// Primary filter variable, `RUST_LOG` is consulted when it is unset
pub const LOG_ENV: &str = "COSMIC_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Calling it again is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter())
        .with_ansi(false)
        .try_init();
}

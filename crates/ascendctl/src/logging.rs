//! Logging for ascendctl
//!
//! Diagnostics go to stderr through tracing so command output on stdout stays
//! clean. `ASCEND_LOG` takes an EnvFilter directive and wins over the config
//! file's `[logging] level`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "ASCEND_LOG";

/// Filter from `ASCEND_LOG`, else the configured default
pub fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

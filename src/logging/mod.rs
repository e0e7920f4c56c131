//! Logging setup
//!
//! Installs the global tracing subscriber. `RUST_LOG` wins when set;
//! otherwise this crate logs at the configured level and dependencies at
//! `info`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is absent
pub fn default_filter(level: &str) -> String {
    format!("snippet_store={},info", level)
}

/// Install the global subscriber, plain text or JSON lines
pub fn init(level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());

    // Logs go to stderr so command output on stdout stays machine readable
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

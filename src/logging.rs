//! Tracing prelude and subscriber setup

pub use tracing::{debug, error, info, warn};

/// Log to stderr, filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_writer(std::io::stderr)
		.init();
}

// vim: ts=4

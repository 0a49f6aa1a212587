//! Development-time tracing for debugging hyprlander.
//!
//! Diagnostics go to stderr and are filtered by `RUST_LOG`. The conversation
//! driver logs each turn and how it ended, the Gemini client logs requests and
//! HTTP status, and the tool executor logs file access and spawned commands
//! along with child timeouts and truncated output. Everything meant for the
//! user goes through [`crate::io::ui::Ui`] instead.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=hyprlander=debug hyprlander prompt "make the gaps smaller"
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

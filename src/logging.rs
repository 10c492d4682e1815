//! Logging init: human-readable progress on stderr, JSON results stay on stdout.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,bookmark_archiver=info";
const VERBOSE_FILTER: &str = "info,bookmark_archiver=debug";

/// Initialize logging to stderr. `RUST_LOG` overrides the default filter.
pub fn init_logging(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // try_init: tests and embedding callers may already have a subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .try_init();
}

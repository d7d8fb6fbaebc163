//! Tracing subscriber setup.

use std::env;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "notify_relay=info,tower_http=info";
const VERBOSE_FILTER: &str = "notify_relay=debug,tower_http=debug";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the built-in filter. `LOG_FORMAT=json` switches to
/// JSON lines.
pub fn init(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}

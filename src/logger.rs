pub use tracing::{debug, error, info, instrument, trace, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt::{self, format::FmtSpan}};

/// Default filter when `RUST_LOG` is unset. Stage spans from this crate are
/// kept at `info`; the HTTP stack is quietened.
const DEFAULT_DIRECTIVES: &str = "info,hyper=warn,reqwest=warn,rustls=warn";

pub fn init() {
    init_with(DEFAULT_DIRECTIVES);
}

/// Installs the global subscriber. `verbose` raises this crate to `debug`,
/// which also turns on span close events so per-stage durations are printed.
pub fn init_verbose(verbose: bool) {
    if verbose {
        init_with("debug,hyper=warn,reqwest=warn,rustls=warn");
    } else {
        init();
    }
}

fn init_with(default_directives: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let is_debug = env_filter.to_string().contains("debug") ||
                   std::env::var("RUST_LOG").unwrap_or_default().contains("debug");

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::uptime())
        .with_span_events(if is_debug {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        });

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

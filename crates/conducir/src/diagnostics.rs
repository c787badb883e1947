//! Diagnostic logging setup.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber for a harness run.
///
/// `RUST_LOG` wins when set; otherwise verbose mode maps to `debug` and
/// normal runs to `info`. Calling this more than once is harmless.
pub fn init_diagnostics(verbose: bool) {
    let default_directive = if verbose {
        "conducir=debug"
    } else {
        "conducir=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

//! Diagnostics for the command-line tool.
//!
//! Filtering follows `RUST_LOG` (for example `RUST_LOG=textbook_prose=debug` to see why a table
//! or an equation was left as plain text). Without it only warnings are shown, or everything
//! from `debug` up with `--verbose`. Output goes to stderr so stdout stays machine-readable.
use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

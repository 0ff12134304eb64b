//! Terminal front end for the support desk backend.

pub mod cli;
pub mod commands;
pub mod notify;
pub mod render;

use tracing_subscriber::EnvFilter;

/// Logs go to stderr; `RUST_LOG` wins over the verbosity flag.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

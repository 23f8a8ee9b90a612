//! Tracing setup shared by the binaries.
//!
//! Logs go to stderr so the status line on stdout stays readable.

use tracing::Level;

pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    init_with_level(level);
}

pub fn init_with_level(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

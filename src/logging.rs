use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter, e.g. `tapwise=debug`.
pub const LOG_ENV: &str = "TAPWISE_LOG";

const DEFAULT_FILTER: &str = "tapwise=info";

/// Install a file-backed subscriber. The terminal belongs to the UI, so
/// nothing is ever written to stdout/stderr.
///
/// Returns false (and leaves logging off) when the file cannot be opened or
/// a subscriber is already installed.
pub fn init(path: &Path) -> bool {
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return false;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return false;
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .is_ok()
}

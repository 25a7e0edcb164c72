// Library surface for the binary, headless tests and reuse.
// The terminal front end lives in main.rs and ui.rs.
pub mod app_dirs;
pub mod comparator;
pub mod config;
pub mod content;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod policy;
pub mod runtime;
pub mod session;
pub mod text;
pub mod time_series;
pub mod timer;

/// How often the front end advances the session clock.
pub const TICK_RATE_MS: u64 = 100;

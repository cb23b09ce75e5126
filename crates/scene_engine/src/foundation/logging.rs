//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// `RUST_LOG` wins when it is set; otherwise `default_level` (for example
/// `"info"` or `"scene_engine=debug"`) is used as the filter. Calling this more
/// than once is harmless, later calls are ignored.
pub fn init(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::trace!("Logger already initialized, keeping existing configuration");
    }
}

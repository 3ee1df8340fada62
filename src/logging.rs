//! Tracing setup for the `codemark` binary.
//!
//! Logs go to stderr so stdout stays parseable for scripts. `RUST_LOG`
//! overrides the level from `[logging]` in the config file.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "codemark={level},codemark_core={level},warn",
            level = config.level
        ))
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(atty::is(atty::Stream::Stderr)),
        )
        .try_init();
}

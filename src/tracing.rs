//! Log output for the simulator and library
//!
//! Panel state changes log under `panelkit::panel`, thumbnail fetches and
//! evictions under `panelkit::cache`, file events under
//! `panelkit::wallpaper`. Pick them with `RUST_LOG`, for example
//! `RUST_LOG=panelkit::cache=debug`.
//!
//! A second copy at debug level goes to a daily file in the panelkit
//! `logs/` directory (see [`crate::config_paths::logs_dir`]).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const FILE_FILTER: &str = "debug";

/// Install the global subscriber.
///
/// `default_filter` applies to the terminal when `RUST_LOG` is unset.
/// If the logs directory cannot be created only the terminal is used.
/// A subscriber installed earlier wins and this call does nothing.
pub fn init(default_filter: &str) {
    let terminal_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let terminal = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_filter(terminal_filter);

    let file = crate::config_paths::ensure_logs_dir()
        .map_err(|e| eprintln!("panelkit: file logging disabled: {:#}", e))
        .ok()
        .map(|dir| {
            let writer = tracing_appender::rolling::daily(dir, crate::config_paths::LOG_FILE_PREFIX);
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_filter(EnvFilter::new(FILE_FILTER))
        });

    let _ = tracing_subscriber::registry()
        .with(terminal)
        .with(file)
        .try_init();
}

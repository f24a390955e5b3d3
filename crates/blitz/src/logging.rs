//! Logging initialization.
//!
//! Logs go to stderr so stdout stays free for JSONL reports.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `verbose` when set.
pub fn init(verbose: bool, json_format: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` section, with CLI flags on top.
pub fn init_from_config(
    config: &blitz_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let (verbose, json_format) = resolve(&config.logging, verbose_override, json_logs_override);
    init(verbose, json_format);
}

fn resolve(
    logging: &blitz_core::config::LoggingConfig,
    verbose_override: bool,
    json_logs_override: bool,
) -> (bool, bool) {
    let level = logging.level.to_lowercase();
    let verbose = verbose_override || level == "debug" || level == "trace";
    let json_format = json_logs_override || logging.format.eq_ignore_ascii_case("json");
    (verbose, json_format)
}

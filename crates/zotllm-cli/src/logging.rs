//! Logging setup.
//!
//! Logs go to stderr so that a JSON report on stdout stays parseable.

use tracing_subscriber::EnvFilter;

/// Level used when nothing else chooses one
pub const DEFAULT_LEVEL: &str = "info";

/// Pick the filter directive.
///
/// `--verbose` wins over `--log-level`, which wins over `RUST_LOG`, which
/// wins over the configured level.
pub fn filter_directive(
    verbose: bool,
    cli_level: Option<&str>,
    env_filter: Option<&str>,
    config_level: Option<&str>,
) -> String {
    if verbose {
        return "debug".to_string();
    }
    [cli_level, env_filter, config_level]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(DEFAULT_LEVEL)
        .to_string()
}

/// Install the global subscriber.
///
/// An invalid directive falls back to `info`. Installing twice is a no-op.
pub fn init(verbose: bool, cli_level: Option<&str>, config_level: Option<&str>) {
    let env_filter = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(verbose, cli_level, env_filter.as_deref(), config_level);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

//! Small shared utilities: logging setup.

/// Initialize the `env_logger` backend for the `log` facade used throughout
/// the crate. `verbose` raises the default level from Info to Debug; this
/// is the single place both binaries configure logging, so the `-v` flag
/// behaves identically across `sirna-build` and `sirna-predict`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

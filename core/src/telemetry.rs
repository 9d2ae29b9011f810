use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `fingenius_core=debug`.
pub const LOG_ENV: &str = "FINGENIUS_LOG";

/// Installs the global fmt subscriber. Returns false if one was already set.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

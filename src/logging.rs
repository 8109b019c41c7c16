use tracing_subscriber::EnvFilter;

/// Environment variable overriding the configured log level
pub const LOG_ENV: &str = "LEWTWO_LOG";

pub const DEFAULT_LEVEL: &str = "warn";

/// Pick the filter directive: `LEWTWO_LOG`, then the configured level.
fn filter_for(env_value: Option<&str>, configured: &str) -> EnvFilter {
    let directive = env_value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(configured);
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Install the stderr subscriber. Later calls are no-ops.
pub fn init(configured: &str) {
    let env_value = std::env::var(LOG_ENV).ok();
    let filter = filter_for(env_value.as_deref(), configured);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

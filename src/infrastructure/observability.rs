use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    // Plain console output unless JSON is asked for
    let use_json = std::env::var("LOG_JSON").map(|v| v == "true").unwrap_or(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }
}

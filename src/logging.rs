use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive, e.g. `mstat=debug`.
const LOG_ENV: &str = "MSTAT_LOG";

/// Log to stderr so stdout stays clean for `--json`.
pub fn init(verbose: bool) {
    let default = if verbose { "mstat=debug" } else { "mstat=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if let Err(e) = result {
        eprintln!("mstat: logging already initialised: {}", e);
    }
}

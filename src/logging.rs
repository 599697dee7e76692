use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr. `RUST_LOG` overrides the verbosity flag.
pub fn init(verbose: bool) {
    let default_directive = if verbose { "calcbot=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

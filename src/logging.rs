use tracing_subscriber::EnvFilter;

/// Initialise logging at `info`, or `debug` when requested. `RUST_LOG` is
/// only honoured in debug mode so a stray environment variable cannot make a
/// normal session noisy.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

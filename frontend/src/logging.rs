use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. Output goes to stderr so that the
/// terminal front end keeps stdout for its prompts. `RUST_LOG` overrides
/// the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aum=info,warn"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    if let Err(e) = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init() {
        eprintln!("Warning: Failed to initialize logging: {e}");
    }
}

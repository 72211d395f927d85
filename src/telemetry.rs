use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Structured JSON logging to stdout, filtered by `RUST_LOG`.
///
/// Also installs the `log` bridge, so request logs emitted through the `log`
/// facade end up in the same stream. Call once at process start.
pub fn init_telemetry() {
    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .json();

    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_LOG_FILTER))
        .with(formatting_layer)
        .init();
}

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// JSON logs filtered by `RUST_LOG`, `info` by default. Panics if a global
/// subscriber is already set.
pub fn init() {
    if let Err(err) = try_init() {
        panic!("logging already initialized: {err}");
    }
}

pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    let fmt_layer = fmt::layer().json();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()
}

//! Logging setup
//!
//! Embedders call [`init_logging`] once at startup; the store itself only
//! emits `tracing` events.

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directive used when `RUST_LOG` is unset
pub const DEFAULT_LOG_DIRECTIVE: &str = "notekeeper=debug,info";

/// Build the filter from `RUST_LOG`, falling back to `default_directive`
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into())
}

fn layered<W>(default_directive: &str, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(env_filter(default_directive))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
}

/// Install the global subscriber writing to stdout.
///
/// Returns an error if a global subscriber has already been set.
pub fn init_logging(
    default_directive: &str,
) -> std::result::Result<(), tracing_subscriber::util::TryInitError> {
    layered(default_directive, std::io::stdout).try_init()
}

//! Tracing setup: `EnvFilter` plus a non-blocking formatter on stderr.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber. Call once, at process start.
///
/// Returns the non-blocking writer's flush guard; the caller must hold it
/// for the lifetime of `main`, or buffered log lines are dropped on exit.
#[must_use]
pub fn init() -> tracing_appender::non_blocking::WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jervis=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    guard
}

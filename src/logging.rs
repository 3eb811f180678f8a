//! Log setup: human-readable lines on stderr plus a daily rolling file.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives are read from this variable, e.g. `homesync=debug`.
pub const LOG_ENV: &str = "HOMESYNC_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Keep the returned guard alive until exit or
/// buffered file output is lost.
pub fn init(log_dir: &Path) -> WorkerGuard {
  let appender = tracing_appender::rolling::daily(log_dir, "homesync.log");
  let (file_writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(fmt::layer().with_ansi(false).with_writer(file_writer))
    .init();

  guard
}

//! Log output setup for the server binary.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Builds the level filter
///
/// `RUST_LOG` wins over the `debug` flag; the default level is `info`.
pub fn env_filter(debug: bool) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Installs the global subscriber
///
/// Logs go to stdout, as JSON lines when `json` is set. With a `log_dir`
/// they are also written to a daily rolling `storefront.log` there; the
/// returned guard must be kept alive until shutdown so the file writer
/// flushes.
pub fn init_logging(debug: bool, json: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let stdout_layer = if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "storefront.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).with_ansi(false).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(stdout_layer)
        .with(file_layer)
        .init();

    tracing::info!(json, log_dir = ?log_dir, "Logging initialized");
    guard
}

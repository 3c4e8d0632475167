use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use super::config::Config;

/// Install the global tracing subscriber.
///
/// Console output goes to stderr, filtered by `RUST_LOG` (or `treesweep=debug`
/// when verbose, `warn` otherwise). When the logs directory is writable a
/// daily-rolling file also receives `info` and above. The returned guard must
/// be held for the lifetime of the process so buffered lines get flushed.
pub fn init(verbose: bool) -> Option<WorkerGuard> {
    let console_filter = if verbose {
        EnvFilter::new("treesweep=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let logs_dir = Config::logs_dir();
    let appender = std::fs::create_dir_all(&logs_dir).ok().and_then(|_| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("treesweep")
            .filename_suffix("log")
            .build(&logs_dir)
            .ok()
    });

    let (file_layer, guard) = if let Some(appender) = appender {
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(EnvFilter::new("treesweep=info"));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init();

    guard
}

//! Tracing subscriber setup for the binary.
//!
//! `RUST_LOG` filters (default `bodhi_api=debug,tower_http=debug`). Output
//! goes to stdout or to a daily-rotated file, as text or JSON lines.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::{LogConfig, LogFormat};

pub const DEFAULT_FILTER: &str = "bodhi_api=debug,tower_http=debug";

/// Install the global subscriber. The returned guard flushes the file
/// writer on drop and must live as long as the process logs.
pub fn init_tracing(log: &LogConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (writer, guard) = match log.file_target() {
        Some((dir, name)) => {
            let appender = tracing_appender::rolling::daily(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(log.use_ansi());
    let layer = match log.format {
        LogFormat::Json => fmt.json().boxed(),
        LogFormat::Text => fmt.boxed(),
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
    guard
}

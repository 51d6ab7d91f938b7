//! Logging setup
//!
//! Structured logging for the portal binary: terse console output by
//! default, optional daily-rolling file output when a log directory is
//! configured.

use std::path::Path;

/// Initialize the global tracing subscriber.
///
/// `log_dir` switches output to daily-rolling files when the directory
/// exists; otherwise everything goes to the console.
pub fn init(log_level: &str, log_dir: Option<&str>) {
    let level = log_level.parse().unwrap_or(tracing::Level::INFO);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false);

    if let Some(dir) = log_dir
        && Path::new(dir).exists()
    {
        let appender = tracing_appender::rolling::daily(dir, "member-portal");
        subscriber.with_writer(appender).with_ansi(false).init();
        return;
    }

    subscriber.init();
}

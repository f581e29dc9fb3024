//! Tracing pipeline for the binary crate (SPEC_FULL.md "Logging & tracing").
//!
//! Library crates only emit `tracing` spans/events; this is the one place
//! that initializes a global subscriber, matching the teacher's
//! single-init-point convention.

use std::path::PathBuf;

use tracing_subscriber::{fmt, EnvFilter};

pub struct LoggingOptions {
    pub json: bool,
    pub log_file: Option<PathBuf>,
}

/// Returned guard must be held for the process lifetime when `log_file` is
/// set — dropping it stops the rolling file writer.
pub fn init(options: &LoggingOptions) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_env("SCENARIO_RUNNER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = &options.log_file {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scenario-runner.log".to_string());
        let appender = tracing_appender::rolling::never(
            dir.unwrap_or_else(|| std::path::Path::new(".")),
            file_name,
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let subscriber = fmt().with_env_filter(filter).with_writer(non_blocking);
        if options.json {
            subscriber.json().init();
        } else {
            subscriber.init();
        }
        Some(guard)
    } else {
        let subscriber = fmt().with_env_filter(filter);
        if options.json {
            subscriber.json().init();
        } else {
            subscriber.init();
        }
        None
    }
}

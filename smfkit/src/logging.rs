//! Logging setup for the smfkit CLI and library consumers.
//!
//! - Compact human-readable output on stderr
//! - Optional plain-text log file written through a non-blocking appender
//! - Level from `RUST_LOG`, defaulting to `info` (`debug` when verbose)

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Initialize logging.
///
/// When `log_file` is given its parent directory is created and any previous
/// content is cleared. `verbose` overrides `RUST_LOG`.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the file
/// cannot be cleared.
pub fn init_logging(log_file: Option<&Path>, verbose: bool) -> Result<LoggingGuard, io::Error> {
    let env_filter = if verbose {
        EnvFilter::new(default_directive(true))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(false)))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let (file_layer, file_guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name"))?;
            fs::create_dir_all(dir)?;
            fs::write(path, "")?;

            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "info");
        assert_eq!(default_directive(true), "debug");
    }

    #[test]
    fn test_guard_structure() {
        use tracing_appender::non_blocking::NonBlocking;

        let (non_blocking, guard) = NonBlocking::new(std::io::sink());
        drop(non_blocking);
        let _logging_guard = LoggingGuard {
            _file_guard: Some(guard),
        };
    }

    // Installing the global subscriber can only happen once per process, so
    // init_logging itself is exercised by the CLI integration tests.
}

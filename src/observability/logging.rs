//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the process-wide subscriber exactly once at startup
//! - Duplicate every record to the console and to an append-only log file
//! - Configure log level from config, with `RUST_LOG` taking precedence
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging; request fields live on spans
//! - JSON format for production, human-readable format for development
//! - File writes go through a non-blocking worker; the returned guard flushes on drop

use std::fs::{self, File, OpenOptions};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;

/// Log target for records emitted by this crate.
const DEFAULT_LOG_TARGET: &str = "greeter_service";

/// Error raised while setting up logging. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to open log file {}: {source}", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to install global subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Guard that keeps the file writer thread alive.
///
/// Must be held for the lifetime of the application so buffered records
/// reach the file before the process exits.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file_guard: WorkerGuard,
}

/// Open (creating parent directories) the log file in append mode.
pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let open = || -> std::io::Result<File> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    };

    open().map_err(|source| LoggingError::OpenFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Install the global subscriber. Call once, before anything else logs.
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuard, LoggingError> {
    let file = open_log_file(&config.file_path)?;
    let (file_writer, file_guard) = tracing_appender::non_blocking(file);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(&config.level));

    subscriber(
        filter,
        config.json,
        std::io::stdout().is_terminal(),
        std::io::stdout,
        file_writer,
    )
    .try_init()?;

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}

fn default_filter(level: &str) -> EnvFilter {
    let level = level.to_ascii_lowercase();
    EnvFilter::new(format!(
        "{DEFAULT_LOG_TARGET}={level},tower_http={level},info"
    ))
}

/// Registry with one console layer and one file layer sharing a single filter.
fn subscriber<C, F>(
    filter: EnvFilter,
    json: bool,
    ansi: bool,
    console: C,
    file: F,
) -> impl Subscriber + Send + Sync + 'static
where
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let console_layer = fmt::layer().with_ansi(ansi).with_writer(console);
    let file_layer = fmt::layer().with_ansi(false).with_writer(file);

    let (console_layer, file_layer) = if json {
        (
            console_layer.json().flatten_event(true).boxed(),
            file_layer.json().flatten_event(true).boxed(),
        )
    } else {
        (console_layer.boxed(), file_layer.boxed())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::{Level, Subscriber};

    /// In-memory log sink for assertions.
    #[derive(Clone, Default)]
    pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        pub fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
            self.subscriber_at(Level::TRACE)
        }

        /// Subscriber that drops everything less severe than `level`.
        pub fn subscriber_at(&self, level: Level) -> impl Subscriber + Send + Sync + 'static {
            let logs = self.clone();
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(move || logs.clone())
                .finish()
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }

        pub fn lines_at(&self, level: &str) -> Vec<String> {
            self.contents()
                .lines()
                .filter(|line| line.contains(level))
                .map(str::to_owned)
                .collect()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

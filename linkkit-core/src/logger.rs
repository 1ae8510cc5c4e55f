//! Bridge from the `log` facade to a host-provided [`Logger`].
//!
//! Everything this crate logs goes through the `log` macros. A host installs
//! its own sink once with [`set_logger`]; until then records are dropped.

use std::sync::{Arc, OnceLock};

/// Receives the log records emitted by this crate.
///
/// Implemented by the host application, either in Rust or, with the `ffi`
/// feature, in a foreign language through `UniFFI`.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use linkkit_core::logger::{set_logger, LogLevel, Logger};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         eprintln!("[{level:?}] {message}");
///     }
/// }
///
/// set_logger(Arc::new(StderrLogger));
/// ```
///
/// ## Kotlin
///
/// ```kotlin
/// class LinkKitLogger : Logger {
///     override fun log(level: LogLevel, message: String) {
///         Log.println(level.toPriority(), "LinkKit", message)
///     }
/// }
///
/// setLogger(LinkKitLogger()) // once, at startup
/// ```
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait Logger: Sync + Send {
    /// Records one message at `level`.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum LogLevel {
    /// Very detailed tracing of individual exchanges.
    Trace,
    /// Diagnostics such as failed polls or dropped receivers.
    Debug,
    /// Lifecycle progress: link requests created or cleared, monitors started or stopped.
    Info,
    /// Failures the caller will also see as an error, such as an unreachable service.
    Warn,
    /// Failures that leave the library unable to continue.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Forwards `log` records to the installed [`Logger`].
struct ForeignLogger;

static FOREIGN_LOGGER: ForeignLogger = ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        // debug and trace from dependencies (hyper, rustls, ...) are noise for the host
        metadata.level() <= log::Level::Info || metadata.target().starts_with("linkkit")
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(record.level().into(), record.args().to_string());
        }
    }

    fn flush(&self) {}
}

/// Installs `logger` as the sink for every record this crate emits.
///
/// Only the first call takes effect; later calls are ignored. If another
/// `log` implementation was already registered by the host process, records
/// keep going there.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        log::warn!("linkkit logger already set, ignoring");
        return;
    }

    if let Err(e) = log::set_logger(&FOREIGN_LOGGER) {
        eprintln!("failed to install linkkit logger: {e}");
        return;
    }
    log::set_max_level(log::LevelFilter::Trace);
}

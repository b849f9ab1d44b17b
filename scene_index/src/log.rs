//! Diagnostic logging for the spatial index.
//!
//! Trimmed from the teacher engine's logging subsystem: same
//! `Logger`/`LogEntry`/`LogSeverity`/`DefaultLogger` shapes, same colored
//! console format, but routed through a small free-standing singleton
//! instead of the teacher's GPU-backend-aware `Engine` manager (there is
//! no backend here to manage). The only caller of this module is the
//! out-of-range mutation diagnostic named in spec.md §4.5/§7.2.

use colored::*;
use chrono::{DateTime, Local};
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;

/// Implement this trait to route diagnostics somewhere other than stdout
/// (a file, a telemetry pipe, the host engine's own log).
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One diagnostic event.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    pub source: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Colored-console logger, used unless a caller installs their own via
/// [`set_logger`].
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        let severity_str = match entry.severity {
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        };
        let source = entry.source.bright_blue();
        println!("[{timestamp}] [{severity_str}] [{source}] {}", entry.message);
    }
}

static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

/// Install a custom logger, replacing the default colored-console one.
pub fn set_logger(logger_impl: Box<dyn Logger>) {
    *logger().write().expect("logger lock poisoned") = logger_impl;
}

/// Emit a diagnostic event. Used internally by the trees; exposed so the
/// same channel can be reused by callers composing their own queries.
pub fn log(severity: LogSeverity, source: &str, message: String) {
    let entry = LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: source.to_string(),
        message,
    };
    logger().read().expect("logger lock poisoned").log(&entry);
}

/// Emit a WARN diagnostic (spec.md §7.2: out-of-range mutation).
#[macro_export]
macro_rules! tree_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log(
            $crate::log::LogSeverity::Warn,
            $source,
            format!($($arg)*),
        )
    };
}

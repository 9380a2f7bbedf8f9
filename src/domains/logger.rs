use chrono::Utc;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        })
    }
}

/// Sink for run-level events: run start and finish, traveler halts, traps
/// firing. Per-step chatter goes through `tracing` instead.
///
/// Implementations must never write to stdout, which carries the trace
/// stream.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);

    fn log(&self, level: LogLevel, msg: &str) {
        match level {
            LogLevel::Info => self.info(msg),
            LogLevel::Warn => self.warn(msg),
            LogLevel::Error => self.error(msg),
        }
    }
}

pub type DynLogger = Arc<dyn DomainLogger>;

/// Appends run events to a log file through the global `log` facade, with
/// `fast_log` as the backend.
pub struct FileLogger {
    path: String,
}

impl FileLogger {
    /// Installs the file backend. Only one backend can be installed per
    /// process, so a second call fails.
    pub fn init(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        fast_log::init(
            fast_log::config::Config::new()
                .file(path)
                .level(log::LevelFilter::Info),
        )?;
        Ok(Self {
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn stamped(msg: &str) -> String {
        format!("{} {}", Utc::now().to_rfc3339(), msg)
    }
}

impl DomainLogger for FileLogger {
    fn info(&self, msg: &str) {
        log::info!("{}", Self::stamped(msg));
    }

    fn warn(&self, msg: &str) {
        log::warn!("{}", Self::stamped(msg));
    }

    fn error(&self, msg: &str) {
        log::error!("{}", Self::stamped(msg));
    }
}

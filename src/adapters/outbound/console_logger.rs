use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// Writes to stderr; stdout belongs to the trace stream.
struct StderrBridge;

impl DomainLogger for StderrBridge {
    fn info(&self, msg: &str) { eprintln!("INFO: {}", msg); }
    fn warn(&self, msg: &str) { eprintln!("WARN: {}", msg); }
    fn error(&self, msg: &str) { eprintln!("ERROR: {}", msg); }
}

/// Console-backed DomainLogger, the fallback when no log file is configured.
pub fn init_console_logger() -> Arc<dyn DomainLogger> {
    Arc::new(StderrBridge {})
}

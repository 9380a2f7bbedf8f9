use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// Forwards every message to each of its targets, in order.
pub struct MultiLogger {
    targets: Vec<Arc<dyn DomainLogger>>,
}

impl MultiLogger {
    pub fn new(targets: Vec<Arc<dyn DomainLogger>>) -> Self {
        Self { targets }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.error(msg));
    }
}

/// Log file plus stderr; falls back to stderr alone if the file logger
/// cannot be installed.
pub fn init_combined_logger(path: &str) -> Arc<dyn DomainLogger> {
    let console = super::init_console_logger();
    match super::init_file_logger(path) {
        Ok(file_logger) => {
            Arc::new(MultiLogger::new(vec![file_logger, console])) as Arc<dyn DomainLogger>
        }
        Err(e) => {
            console.warn(&e);
            console
        }
    }
}

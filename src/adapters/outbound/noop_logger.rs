use crate::domains::logger::DomainLogger;
use std::sync::Arc;

struct Silent;

impl DomainLogger for Silent {
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// Discards everything; the default for simulation tests.
pub fn init_noop_logger() -> Arc<dyn DomainLogger> {
    Arc::new(Silent {})
}

use crate::domains::logger::{DomainLogger, FileLogger};
use std::sync::Arc;

/// Opens the run log file and returns it as a domain logger.
pub fn init_file_logger(path: &str) -> Result<Arc<dyn DomainLogger>, String> {
    let logger = FileLogger::init(path)
        .map_err(|e| format!("cannot open run log {}: {}", path, e))?;
    tracing::debug!(path = logger.path(), "run log opened");
    Ok(Arc::new(logger))
}

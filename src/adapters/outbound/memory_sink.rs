use crate::common::{Trace, TraceHeader};
use crate::domains::TraceSink;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// Keeps every written line in memory. Clones share the same buffer, so a
/// test can hand one clone to the simulation and read from another.
#[derive(Clone, Default)]
pub struct MemorySink {
    header: Arc<Mutex<Option<TraceHeader>>>,
    traces: Arc<Mutex<Vec<Trace>>>,
    flushed: Arc<Mutex<bool>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> Option<TraceHeader> {
        *self.header.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn traces(&self) -> Vec<Trace> {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The stream as the text sink would have rendered it.
    pub fn lines(&self) -> Vec<String> {
        self.header()
            .map(|h| h.to_string())
            .into_iter()
            .chain(self.traces().iter().map(|t| t.to_string()))
            .collect()
    }

    pub fn is_flushed(&self) -> bool {
        *self.flushed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TraceSink for MemorySink {
    async fn write_header(&mut self, header: &TraceHeader) -> std::io::Result<()> {
        *self.header.lock().unwrap_or_else(PoisonError::into_inner) = Some(*header);
        Ok(())
    }

    async fn write_trace(&mut self, trace: &Trace) -> std::io::Result<()> {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*trace);
        Ok(())
    }

    async fn flush(&mut self) -> std::io::Result<()> {
        *self.flushed.lock().unwrap_or_else(PoisonError::into_inner) = true;
        Ok(())
    }
}

use crate::common::{Trace, TraceHeader};
use async_trait::async_trait;

/// Destination of the collector's output stream.
/// Adapters decide the medium (stdout for the visualizer, memory in tests).
#[async_trait]
pub trait TraceSink: Send + 'static {
    async fn write_header(&mut self, header: &TraceHeader) -> std::io::Result<()>;
    async fn write_trace(&mut self, trace: &Trace) -> std::io::Result<()>;
    async fn flush(&mut self) -> std::io::Result<()>;
}

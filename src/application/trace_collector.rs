use crate::common::{ApplicationResult, TraceBatch, TraceHeader, TraceQueue};
use crate::config::OutputOrder;
use crate::domains::TraceSink;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectorReport {
    pub batches: usize,
    pub traces: usize,
}

/// Single consumer of trace batches. Stops once every queue sender is
/// dropped and the queue is drained.
pub struct TraceCollector<S: TraceSink> {
    sink: S,
    header: TraceHeader,
    order: OutputOrder,
    receiver: mpsc::Receiver<TraceBatch>,
}

impl<S: TraceSink> TraceCollector<S> {
    pub fn spawn(
        sink: S,
        header: TraceHeader,
        order: OutputOrder,
        capacity: usize,
    ) -> (TraceQueue, JoinHandle<ApplicationResult<CollectorReport>>) {
        let (queue, receiver) = mpsc::channel(capacity);
        let collector = Self {
            sink,
            header,
            order,
            receiver,
        };
        (queue, tokio::spawn(collector.run()))
    }

    async fn run(mut self) -> ApplicationResult<CollectorReport> {
        self.sink.write_header(&self.header).await?;

        let mut report = CollectorReport::default();
        let mut held = Vec::new();
        while let Some(batch) = self.receiver.recv().await {
            report.batches += 1;
            report.traces += batch.len();
            match self.order {
                OutputOrder::Arrival => {
                    for trace in &batch {
                        self.sink.write_trace(trace).await?;
                    }
                }
                OutputOrder::Timestamp => held.extend(batch),
            }
        }

        // stable, so equal timestamps keep their arrival order
        held.sort_by_key(|trace| trace.timestamp);
        for trace in &held {
            self.sink.write_trace(trace).await?;
        }

        self.sink.flush().await?;
        debug!(batches = report.batches, traces = report.traces, "collector drained");
        Ok(report)
    }
}

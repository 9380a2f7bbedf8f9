use crate::domains::logger::{DomainLogger, LogLevel};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Non-blocking logger handed to agent tasks. Messages are queued for a
/// forwarder task that passes them to the wrapped logger; when the queue is
/// full the message is dropped and counted, so an agent never waits on I/O.
pub struct BufferedLogger {
    sender: mpsc::Sender<(LogLevel, String)>,
    dropped: Arc<AtomicUsize>,
}

impl BufferedLogger {
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push(&self, level: LogLevel, msg: &str) {
        if self.sender.try_send((level, msg.to_string())).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl DomainLogger for BufferedLogger {
    fn info(&self, msg: &str) {
        self.push(LogLevel::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(LogLevel::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(LogLevel::Error, msg);
    }
}

/// Must be called inside a tokio runtime. The returned handle completes once
/// every clone of the logger is dropped and the queue is drained.
pub fn init_buffered_logger(
    target: Arc<dyn DomainLogger>,
    capacity: usize,
) -> (Arc<BufferedLogger>, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::channel::<(LogLevel, String)>(capacity);

    let forwarder = tokio::spawn(async move {
        while let Some((level, msg)) = receiver.recv().await {
            target.log(level, &msg);
        }
    });

    let logger = Arc::new(BufferedLogger {
        sender,
        dropped: Arc::new(AtomicUsize::new(0)),
    });
    (logger, forwarder)
}

use crate::common::{Trace, TraceHeader};
use crate::domains::TraceSink;
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter, Stdout};

/// Line-oriented text sink consumed by the external visualizer.
pub struct TextSink<W> {
    writer: BufWriter<W>,
}

pub type StdoutSink = TextSink<Stdout>;

impl StdoutSink {
    pub fn stdout() -> Self {
        TextSink::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send + 'static> TextSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    async fn line(&mut self, line: String) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send + 'static> TraceSink for TextSink<W> {
    async fn write_header(&mut self, header: &TraceHeader) -> std::io::Result<()> {
        self.line(header.to_string()).await
    }

    async fn write_trace(&mut self, trace: &Trace) -> std::io::Result<()> {
        self.line(trace.to_string()).await
    }

    async fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush().await
    }
}

use crate::frame::CaptureFrame;
use std::{future::Future, path::PathBuf, pin::Pin, time::Duration};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc::Sender;

const LOG_TARGET: &str = "ingest";

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("io error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Produces capture frames in order until exhausted. A source stops early
/// without error when the receiving side hangs up.
pub trait FrameSource: Send + Sync {
    fn start(
        &self,
        tx: Sender<CaptureFrame>,
    ) -> Pin<Box<dyn Future<Output = Result<(), IngestError>> + Send + 'static>>;
}

/// Reads newline-delimited JSON frames from a file. Blank lines are skipped;
/// malformed lines are logged and skipped.
#[derive(Clone, Debug)]
pub struct JsonlFrameSource {
    path: PathBuf,
    pacing: Option<Duration>,
}

impl JsonlFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pacing: None,
        }
    }

    /// Emit at most one frame per `interval`, mimicking a live capture loop.
    pub fn paced(mut self, interval: Duration) -> Self {
        self.pacing = Some(interval);
        self
    }
}

impl FrameSource for JsonlFrameSource {
    fn start(
        &self,
        tx: Sender<CaptureFrame>,
    ) -> Pin<Box<dyn Future<Output = Result<(), IngestError>> + Send + 'static>> {
        let this = self.clone();
        Box::pin(async move {
            let io_err = |source: std::io::Error| IngestError::Io {
                path: this.path.clone(),
                source,
            };
            let file = tokio::fs::File::open(&this.path).await.map_err(io_err)?;
            let mut lines = tokio::io::BufReader::new(file).lines();
            let mut ticker = this.pacing.map(tokio::time::interval);

            tracing::info!(target: LOG_TARGET, path = %this.path.display(), "reading capture frames");

            let mut line_no = 0usize;
            let mut sent = 0u64;
            while let Some(line) = lines.next_line().await.map_err(io_err)? {
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                let frame = match serde_json::from_str::<CaptureFrame>(&line) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(target: LOG_TARGET, line = line_no, error = %e, "skipping malformed frame");
                        continue;
                    }
                };
                if let Some(ticker) = ticker.as_mut() {
                    ticker.tick().await;
                }
                if tx.send(frame).await.is_err() {
                    tracing::debug!(target: LOG_TARGET, sent, "frame receiver dropped");
                    return Ok(());
                }
                sent += 1;
            }

            tracing::info!(target: LOG_TARGET, frames = sent, "capture frames exhausted");
            Ok(())
        })
    }
}

/// In-memory source, mainly for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct VecFrameSource {
    frames: Vec<CaptureFrame>,
}

impl VecFrameSource {
    pub fn new(frames: Vec<CaptureFrame>) -> Self {
        Self { frames }
    }
}

impl FrameSource for VecFrameSource {
    fn start(
        &self,
        tx: Sender<CaptureFrame>,
    ) -> Pin<Box<dyn Future<Output = Result<(), IngestError>> + Send + 'static>> {
        let frames = self.frames.clone();
        Box::pin(async move {
            for frame in frames {
                if tx.send(frame).await.is_err() {
                    break;
                }
            }
            Ok(())
        })
    }
}

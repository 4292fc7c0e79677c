//! Audio sinks and the playback byte stream feeding a live consumer.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::play::PlaybackReader;

/// Destination for synthesized audio chunks.
///
/// The session's receive loop delivers every chunk to every configured sink,
/// in arrival order, and waits for each write to complete before reading the
/// next frame; a slow sink therefore stalls ingestion.
#[async_trait]
pub trait AudioSink: Send {
    /// Deliver one audio chunk.
    async fn write(&mut self, chunk: &[u8]) -> io::Result<()>;
    /// Flush and close after the final chunk of a successful stream.
    async fn finish(&mut self) -> io::Result<()>;
    /// Tear down after a failed stream. Default: nothing.
    async fn abort(&mut self, _reason: &str) {}
}

/// Writes chunks to a file as they arrive.
///
/// When the call fails mid-stream the partial file is left behind; callers
/// must treat it as invalid.
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Create (or truncate) `path`.
    pub async fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;
        Ok(Self { path, file })
    }

    /// Where the audio is being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AudioSink for FileSink {
    async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk).await
    }

    async fn finish(&mut self) -> io::Result<()> {
        self.file.flush().await
    }
}

/// Feeds a bounded in-memory byte stream drained by a playback consumer.
///
/// `write` waits once the channel is full, which is how back-pressure from a
/// slow consumer reaches the session loop. Finishing closes the stream and
/// the consumer sees end-of-file; aborting delivers the failure instead.
pub struct PlaybackSink {
    tx: Option<mpsc::Sender<io::Result<Vec<u8>>>>,
}

/// Create the playback byte stream: the sink half for the session and the
/// blocking reader half for a consumer thread.
pub fn playback_channel(capacity: usize) -> (PlaybackSink, PlaybackReader) {
    let (tx, rx) = mpsc::channel(capacity);
    (PlaybackSink { tx: Some(tx) }, PlaybackReader::new(rx))
}

#[async_trait]
impl AudioSink for PlaybackSink {
    async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        let tx = self.tx.as_ref().ok_or_else(consumer_gone)?;
        tx.send(Ok(chunk.to_vec()))
            .await
            .map_err(|_| consumer_gone())
    }

    async fn finish(&mut self) -> io::Result<()> {
        // Dropping the sender is end-of-stream for the reader.
        self.tx.take();
        Ok(())
    }

    async fn abort(&mut self, reason: &str) {
        if let Some(tx) = self.tx.take() {
            // try_send: the consumer may already be gone or the stream full,
            // and the abort path must not stall.
            let _ = tx.try_send(Err(io::Error::new(io::ErrorKind::Other, reason.to_string())));
        }
    }
}

fn consumer_gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "playback consumer is gone")
}

//! Consumer half of the playback byte stream.

use std::io::{self, Read};

use tokio::sync::mpsc;

/// Blocking reader over the playback byte stream.
///
/// Meant to be drained from a dedicated thread, not from a runtime worker:
/// `read` parks the calling thread until the session delivers more audio.
/// A closed stream is a clean end-of-file; an aborted session surfaces as
/// the recorded error.
pub struct PlaybackReader {
    rx: mpsc::Receiver<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
    pos: usize,
}

impl PlaybackReader {
    pub(crate) fn new(rx: mpsc::Receiver<io::Result<Vec<u8>>>) -> Self {
        Self {
            rx,
            pending: Vec::new(),
            pos: 0,
        }
    }

    /// Receive the next chunk; `false` means the stream is closed.
    fn fill(&mut self) -> io::Result<bool> {
        match self.rx.blocking_recv() {
            Some(Ok(chunk)) => {
                self.pending = chunk;
                self.pos = 0;
                Ok(true)
            }
            Some(Err(e)) => Err(e),
            None => Ok(false),
        }
    }
}

impl Read for PlaybackReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos == self.pending.len() {
            if !self.fill()? {
                return Ok(0);
            }
        }
        let n = (self.pending.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

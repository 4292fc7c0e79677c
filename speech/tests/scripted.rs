//! Test doubles shared by the integration tests: a scripted in-memory
//! transport, server-side frame builders, and recording/failing sinks.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use speech::{AudioSink, SpeechError, Transport};
use wire::{Event, MessageType};

/// Build a server frame by hand, the way the engine would.
pub fn server_frame(ty: MessageType, event: Event, id: Option<&str>, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0x11, ty.bits() << 4 | 0b0100, 0x10, 0x00];
    buf.extend_from_slice(&event.code().to_be_bytes());
    if event.carries_connection_id() || event.is_session_scoped() {
        let id = id.unwrap_or("");
        buf.extend_from_slice(&(id.len() as u32).to_be_bytes());
        buf.extend_from_slice(id.as_bytes());
    }
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Build an error frame with the embedded error code.
pub fn error_frame(code: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0x11, MessageType::Error.bits() << 4, 0x10, 0x00];
    buf.extend_from_slice(&code.to_be_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

pub fn audio_frame(session_id: &str, chunk: &[u8]) -> Vec<u8> {
    server_frame(
        MessageType::AudioOnlyResponse,
        Event::TtsResponse,
        Some(session_id),
        chunk,
    )
}

pub fn control_frame(event: Event, session_id: &str) -> Vec<u8> {
    server_frame(
        MessageType::FullServerResponse,
        event,
        Some(session_id),
        b"{}",
    )
}

/// In-memory transport replaying a fixed inbound script and recording every
/// outbound frame, decoded, for later assertions.
pub struct ScriptedTransport {
    inbound: VecDeque<Vec<u8>>,
    pub sent: Arc<Mutex<Vec<wire::Frame>>>,
    pub closed: Arc<Mutex<bool>>,
}

impl ScriptedTransport {
    pub fn new(inbound: Vec<Vec<u8>>) -> Self {
        Self {
            inbound: inbound.into(),
            sent: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(false)),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, data: Vec<u8>) -> speech::Result<()> {
        let frame = wire::decode(&data).expect("client frames must decode");
        self.sent.lock().unwrap().push(frame);
        Ok(())
    }

    async fn receive(&mut self) -> speech::Result<Vec<u8>> {
        self.inbound
            .pop_front()
            .ok_or(SpeechError::ConnectionClosed)
    }

    async fn close(&mut self) -> speech::Result<()> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// Transport whose receive never completes, for timeout coverage.
pub struct StalledTransport;

#[async_trait]
impl Transport for StalledTransport {
    async fn send(&mut self, _data: Vec<u8>) -> speech::Result<()> {
        Ok(())
    }

    async fn receive(&mut self) -> speech::Result<Vec<u8>> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        unreachable!("the session should have timed out long ago")
    }

    async fn close(&mut self) -> speech::Result<()> {
        Ok(())
    }
}

/// Sink recording every chunk and lifecycle call.
#[derive(Default)]
pub struct RecordingSink {
    pub chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    pub finished: Arc<Mutex<bool>>,
    pub aborted: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.chunks.lock().unwrap().push(chunk.to_vec());
        Ok(())
    }

    async fn finish(&mut self) -> io::Result<()> {
        *self.finished.lock().unwrap() = true;
        Ok(())
    }

    async fn abort(&mut self, reason: &str) {
        *self.aborted.lock().unwrap() = Some(reason.to_string());
    }
}

/// Sink that fails on the nth write.
pub struct FailingSink {
    pub fail_on: usize,
    pub seen: usize,
}

#[async_trait]
impl AudioSink for FailingSink {
    async fn write(&mut self, _chunk: &[u8]) -> io::Result<()> {
        self.seen += 1;
        if self.seen >= self.fail_on {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        Ok(())
    }

    async fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

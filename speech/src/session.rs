//! The connection/session state machine driving one synthesis call.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wire::{Event, MessageType};

use crate::sink::AudioSink;
use crate::transport::Transport;
use crate::types::SynthesisRequest;
use crate::{Result, SpeechError};

/// Default per-frame receive window.
pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifetime of the transport-level link, independent of any session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Idle,
    Requested,
    Active,
    Closing,
    Closed,
    Failed,
}

/// Lifetime of one synthesis request, nested inside an active connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Requested,
    Active,
    Streaming,
    Finishing,
    Finished,
    Failed,
}

/// What a successful synthesis call produced.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Client-generated session token.
    pub session_id: String,
    /// Number of audio chunks received.
    pub chunks: usize,
    /// Total audio bytes fanned out.
    pub bytes: u64,
}

/// Drives one synthesis call over a [`Transport`].
///
/// The control sequence is fixed: open the connection, open a session,
/// submit the text, then drain interleaved control and audio frames until
/// the server finishes the session. Any frame out of order aborts the call;
/// there is no retry and no resynchronization.
pub struct SpeechClient<T> {
    transport: T,
    frame_timeout: Duration,
    connection: ConnectionPhase,
    session: SessionPhase,
}

impl<T: Transport> SpeechClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            frame_timeout: DEFAULT_FRAME_TIMEOUT,
            connection: ConnectionPhase::Idle,
            session: SessionPhase::Idle,
        }
    }

    /// Override the per-frame receive window.
    pub fn with_frame_timeout(mut self, frame_timeout: Duration) -> Self {
        self.frame_timeout = frame_timeout;
        self
    }

    pub fn connection_phase(&self) -> ConnectionPhase {
        self.connection
    }

    pub fn session_phase(&self) -> SessionPhase {
        self.session
    }

    /// Run one synthesis call: open the connection and session, submit the
    /// text, fan audio out to `sinks`, and tear down.
    ///
    /// Every error is terminal. The transport is closed on both paths; on
    /// failure the sinks are aborted and no protocol cleanup is attempted.
    pub async fn synthesize(
        &mut self,
        request: &SynthesisRequest,
        sinks: &mut [Box<dyn AudioSink>],
    ) -> Result<Summary> {
        let result = self.run(request, sinks).await;
        if let Err(err) = &result {
            warn!(%err, "synthesis failed");
            self.connection = ConnectionPhase::Failed;
            if self.session != SessionPhase::Idle {
                self.session = SessionPhase::Failed;
            }
            let reason = err.to_string();
            for sink in sinks.iter_mut() {
                sink.abort(&reason).await;
            }
        }
        let _ = self.transport.close().await;
        if result.is_ok() {
            self.connection = ConnectionPhase::Closed;
        }
        result
    }

    async fn run(
        &mut self,
        request: &SynthesisRequest,
        sinks: &mut [Box<dyn AudioSink>],
    ) -> Result<Summary> {
        // Connection handshake.
        self.send(Event::StartConnection, None, b"{}").await?;
        self.connection = ConnectionPhase::Requested;
        let frame = self.next_frame().await?;
        match frame.event {
            Some(Event::ConnectionStarted) => {
                debug!(
                    connection_id = frame.connection_id.as_deref().unwrap_or(""),
                    "connection started"
                );
                self.connection = ConnectionPhase::Active;
            }
            Some(Event::ConnectionFailed) => {
                return Err(SpeechError::ConnectionFailed(frame.payload_text()));
            }
            _ => return Err(unexpected("ConnectionStarted", &frame)),
        }

        // Session handshake. The token is ours to pick; the server echoes it
        // on every session-scoped frame.
        let session_id = Uuid::new_v4().to_string();
        let config = serde_json::to_vec(&request.session_config())?;
        self.send(Event::StartSession, Some(&session_id), &config)
            .await?;
        self.session = SessionPhase::Requested;
        let frame = self.next_frame().await?;
        match frame.event {
            Some(Event::SessionStarted) => self.session = SessionPhase::Active,
            Some(Event::SessionFailed) => {
                return Err(SpeechError::SessionFailed(frame.payload_text()));
            }
            _ => return Err(unexpected("SessionStarted", &frame)),
        }
        info!(%session_id, voice = %request.voice, "session started");

        // Submit the text, then signal that no more will follow.
        let task = serde_json::to_vec(&request.task())?;
        self.send(Event::TaskRequest, Some(&session_id), &task)
            .await?;
        self.send(Event::FinishSession, Some(&session_id), b"{}")
            .await?;
        self.session = SessionPhase::Streaming;

        // Drain interleaved control and audio frames.
        let mut chunks = 0usize;
        let mut bytes = 0u64;
        loop {
            let frame = self.next_frame().await?;
            match (frame.message_type, frame.event) {
                (MessageType::AudioOnlyResponse, Some(Event::TtsResponse)) => {
                    for sink in sinks.iter_mut() {
                        sink.write(&frame.payload)
                            .await
                            .map_err(SpeechError::SinkWriteFailed)?;
                    }
                    chunks += 1;
                    bytes += frame.payload.len() as u64;
                }
                (MessageType::FullServerResponse, Some(Event::SentenceStart))
                | (MessageType::FullServerResponse, Some(Event::SentenceEnd)) => {
                    debug!(event = ?frame.event, "sentence marker");
                }
                (MessageType::FullServerResponse, Some(Event::SessionFinished)) => {
                    self.session = SessionPhase::Finishing;
                    break;
                }
                (_, Some(Event::SessionFailed)) => {
                    return Err(SpeechError::SessionFailed(frame.payload_text()));
                }
                _ => return Err(unexpected("audio or SessionFinished", &frame)),
            }
        }

        // Close the sinks before releasing the connection; a sink that
        // cannot flush fails the call like any other write.
        for sink in sinks.iter_mut() {
            sink.finish().await.map_err(SpeechError::SinkWriteFailed)?;
        }

        self.send(Event::FinishConnection, None, b"{}").await?;
        self.connection = ConnectionPhase::Closing;
        self.session = SessionPhase::Finished;
        info!(%session_id, chunks, bytes, "synthesis finished");
        Ok(Summary {
            session_id,
            chunks,
            bytes,
        })
    }

    async fn send(&mut self, event: Event, session_id: Option<&str>, payload: &[u8]) -> Result<()> {
        debug!(?event, "sending");
        self.transport
            .send(wire::encode(event, session_id, payload))
            .await
    }

    /// One blocking read, bounded by the configured window. Error-typed
    /// frames abort here so every await site inherits the behavior.
    async fn next_frame(&mut self) -> Result<wire::Frame> {
        let data = match timeout(self.frame_timeout, self.transport.receive()).await {
            Ok(received) => received?,
            Err(_) => return Err(SpeechError::Timeout(self.frame_timeout)),
        };
        let frame = wire::decode(&data)?;
        if frame.message_type == MessageType::Error {
            return Err(SpeechError::ServerError {
                code: frame.error_code.unwrap_or(0),
                message: frame.payload_text(),
            });
        }
        Ok(frame)
    }
}

fn unexpected(expected: &'static str, frame: &wire::Frame) -> SpeechError {
    SpeechError::UnexpectedEvent {
        expected,
        got: frame.event,
    }
}

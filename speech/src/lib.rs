//! Streaming client for the hosted speech-synthesis engine.
//!
//! One synthesis call opens a WebSocket connection, negotiates a session,
//! submits the text, and receives an interleaved sequence of control and
//! audio frames while the server is still producing them. Audio chunks are
//! fanned out, in arrival order, to every configured [`AudioSink`] (a file,
//! a live-playback stream, or both).
//!
//! Every failure is terminal for the call: the client closes the transport
//! and returns, with no retry and no protocol cleanup. A partially written
//! output file is left on disk and should be treated as invalid.

pub mod play;
pub mod session;
pub mod sink;
pub mod transport;
pub mod types;

use std::time::Duration;

use thiserror::Error;

pub use play::PlaybackReader;
pub use session::{ConnectionPhase, SessionPhase, SpeechClient, Summary};
pub use sink::{playback_channel, AudioSink, FileSink, PlaybackSink};
pub use transport::{AuthConfig, Transport, WsTransport};
pub use types::{AudioFormat, SynthesisRequest};

/// Everything that can end a synthesis call early.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The transport could not be dialed.
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    /// An inbound frame could not be decoded.
    #[error(transparent)]
    Frame(#[from] wire::DecodeError),
    /// A control document could not be encoded.
    #[error("failed to encode control document: {0}")]
    Encode(#[from] serde_json::Error),
    /// The server broke the control sequence.
    #[error("unexpected event {got:?} while waiting for {expected}")]
    UnexpectedEvent {
        expected: &'static str,
        got: Option<wire::Event>,
    },
    /// The server refused the connection.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// The server aborted the session.
    #[error("session failed: {0}")]
    SessionFailed(String),
    /// The server sent an error frame.
    #[error("server error {code}: {message}")]
    ServerError { code: u32, message: String },
    /// A configured sink rejected an audio chunk.
    #[error("sink write failed: {0}")]
    SinkWriteFailed(#[source] std::io::Error),
    /// No frame arrived within the configured window.
    #[error("no frame received within {0:?}")]
    Timeout(Duration),
    /// The transport failed mid-call.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server closed the connection before the session finished.
    #[error("connection closed by server")]
    ConnectionClosed,
}

/// Convenience result type used throughout this crate.
pub type Result<T> = std::result::Result<T, SpeechError>;

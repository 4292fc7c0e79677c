//! Frame layout and the encode/decode pair.
//!
//! Header (4 bytes, all multi-byte integers big-endian):
//!
//! ```text
//! byte 0: version << 4 | header size in 4-byte words
//! byte 1: message type << 4 | flags
//! byte 2: serialization << 4 | compression
//! byte 3: reserved (0x00)
//! ```
//!
//! After the header: the event code (`i32`, when the `WithEvent` flag is
//! set), a length-prefixed session or connection id (when the event calls
//! for one), then the length-prefixed payload. `Error` frames instead carry
//! a 4-byte error code followed by the length-prefixed payload.

use thiserror::Error;

use crate::Event;

/// Minimum header length in bytes; anything shorter is malformed.
pub const HEADER_SIZE: usize = 4;

/// Protocol version spoken by this client.
pub const PROTOCOL_VERSION: u8 = 0b0001;

/// Header length in 4-byte words.
pub const HEADER_WORDS: u8 = 0b0001;

/// Flag bit: a big-endian event code follows the header.
pub const FLAG_WITH_EVENT: u8 = 0b0100;

/// Serialization marker for JSON control documents.
pub const SERIALIZATION_JSON: u8 = 0b0001;

/// Compression marker: payloads are sent uncompressed.
pub const COMPRESSION_NONE: u8 = 0b0000;

/// Four-bit message type tag in the second header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Client-to-server control frame.
    FullClientRequest,
    /// Server-to-client control frame.
    FullServerResponse,
    /// Server-to-client audio data frame.
    AudioOnlyResponse,
    /// Server-to-client failure frame with an embedded error code.
    Error,
}

impl MessageType {
    /// Wire tag for this message type.
    pub fn bits(self) -> u8 {
        match self {
            MessageType::FullClientRequest => 0b0001,
            MessageType::FullServerResponse => 0b1001,
            MessageType::AudioOnlyResponse => 0b1011,
            MessageType::Error => 0b1111,
        }
    }

    /// Map a wire tag back to its message type.
    pub fn from_bits(bits: u8) -> Option<Self> {
        let ty = match bits {
            0b0001 => MessageType::FullClientRequest,
            0b1001 => MessageType::FullServerResponse,
            0b1011 => MessageType::AudioOnlyResponse,
            0b1111 => MessageType::Error,
            _ => return None,
        };
        Some(ty)
    }
}

/// One decoded wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type from the header.
    pub message_type: MessageType,
    /// Event carried by the frame; `None` when the `WithEvent` flag was
    /// unset, in which case the event field must not be interpreted.
    pub event: Option<Event>,
    /// Session id for session-scoped events.
    pub session_id: Option<String>,
    /// Connection id on connection-started/-failed replies.
    pub connection_id: Option<String>,
    /// Error code embedded in `Error` frames.
    pub error_code: Option<u32>,
    /// Control document or raw audio bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Payload rendered as text, for failure diagnostics.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Failures turning bytes back into a [`Frame`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Shorter than the 4-byte minimum header.
    #[error("frame too short: {0} bytes")]
    FrameTooShort(usize),
    /// A declared length runs past the end of the buffer.
    #[error("frame truncated while reading {0}")]
    Truncated(&'static str),
    /// Message type tag this client does not speak.
    #[error("unknown message type {0:#06b}")]
    UnknownMessageType(u8),
    /// Event code this client does not speak.
    #[error("unknown event code {0}")]
    UnknownEvent(i32),
    /// A string field was not valid UTF-8.
    #[error("{0} is not valid UTF-8")]
    BadString(&'static str),
}

/// Encode a client frame for `event` with an optional session id and payload.
///
/// Session-scoped events write the session id between the event code and the
/// payload; connection-level events omit the field entirely. The payload is
/// always length-prefixed, zero-length included.
pub fn encode(event: Event, session_id: Option<&str>, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + 8 + payload.len());
    buf.push(PROTOCOL_VERSION << 4 | HEADER_WORDS);
    buf.push(MessageType::FullClientRequest.bits() << 4 | FLAG_WITH_EVENT);
    buf.push(SERIALIZATION_JSON << 4 | COMPRESSION_NONE);
    buf.push(0x00);
    buf.extend_from_slice(&event.code().to_be_bytes());
    if event.is_session_scoped() {
        let sid = session_id.unwrap_or("");
        buf.extend_from_slice(&(sid.len() as u32).to_be_bytes());
        buf.extend_from_slice(sid.as_bytes());
    }
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Decode one inbound frame.
pub fn decode(bytes: &[u8]) -> Result<Frame, DecodeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DecodeError::FrameTooShort(bytes.len()));
    }
    let header_len = ((bytes[0] & 0x0F) as usize) * 4;
    let tag = bytes[1] >> 4;
    let message_type =
        MessageType::from_bits(tag).ok_or(DecodeError::UnknownMessageType(tag))?;
    let flags = bytes[1] & 0x0F;

    let mut r = Reader {
        buf: bytes,
        pos: 0,
    };
    r.take(header_len.max(HEADER_SIZE), "header")?;

    if message_type == MessageType::Error {
        let error_code = r.read_u32("error code")?;
        let payload = r.read_prefixed("payload")?.to_vec();
        return Ok(Frame {
            message_type,
            event: None,
            session_id: None,
            connection_id: None,
            error_code: Some(error_code),
            payload,
        });
    }

    let mut event = None;
    let mut session_id = None;
    let mut connection_id = None;
    if flags & FLAG_WITH_EVENT != 0 {
        let code = r.read_i32("event code")?;
        let ev = Event::from_code(code).ok_or(DecodeError::UnknownEvent(code))?;
        if ev.carries_connection_id() {
            connection_id = Some(r.read_prefixed_string("connection id")?);
        } else if ev.is_session_scoped() {
            session_id = Some(r.read_prefixed_string("session id")?);
        }
        event = Some(ev);
    }
    let payload = r.read_prefixed("payload")?.to_vec();
    Ok(Frame {
        message_type,
        event,
        session_id,
        connection_id,
        error_code: None,
        payload,
    })
}

/// Bounds-checked cursor over the frame bytes.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(DecodeError::Truncated(field))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        let b = self.take(4, field)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_i32(&mut self, field: &'static str) -> Result<i32, DecodeError> {
        let b = self.take(4, field)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_prefixed(&mut self, field: &'static str) -> Result<&'a [u8], DecodeError> {
        let len = self.read_u32(field)? as usize;
        self.take(len, field)
    }

    fn read_prefixed_string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let bytes = self.read_prefixed(field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::BadString(field))
    }
}

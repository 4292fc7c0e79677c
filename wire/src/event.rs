//! Protocol event codes.

/// Semantic purpose of a frame, carried as a big-endian `i32` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// Client asks the server to open the connection.
    StartConnection,
    /// Client signals it is done with the connection.
    FinishConnection,
    /// Server confirms the connection is usable.
    ConnectionStarted,
    /// Server refuses the connection; payload carries the diagnostic.
    ConnectionFailed,
    /// Client opens a synthesis session; payload carries the session config.
    StartSession,
    /// Client signals no more text will follow.
    FinishSession,
    /// Server confirms the session is open.
    SessionStarted,
    /// Server signals all audio for the session has been sent.
    SessionFinished,
    /// Server aborts the session; payload carries the diagnostic.
    SessionFailed,
    /// Client submits synthesis text.
    TaskRequest,
    /// Informational sentence boundary marker.
    SentenceStart,
    /// Informational sentence boundary marker.
    SentenceEnd,
    /// One chunk of synthesized audio.
    TtsResponse,
}

impl Event {
    /// Wire code for this event.
    pub fn code(self) -> i32 {
        match self {
            Event::StartConnection => 1,
            Event::FinishConnection => 2,
            Event::ConnectionStarted => 50,
            Event::ConnectionFailed => 51,
            Event::StartSession => 100,
            Event::FinishSession => 102,
            Event::SessionStarted => 150,
            Event::SessionFinished => 152,
            Event::SessionFailed => 153,
            Event::TaskRequest => 200,
            Event::SentenceStart => 350,
            Event::SentenceEnd => 351,
            Event::TtsResponse => 352,
        }
    }

    /// Map a wire code back to its event, or `None` for codes this client
    /// does not speak.
    pub fn from_code(code: i32) -> Option<Self> {
        let event = match code {
            1 => Event::StartConnection,
            2 => Event::FinishConnection,
            50 => Event::ConnectionStarted,
            51 => Event::ConnectionFailed,
            100 => Event::StartSession,
            102 => Event::FinishSession,
            150 => Event::SessionStarted,
            152 => Event::SessionFinished,
            153 => Event::SessionFailed,
            200 => Event::TaskRequest,
            350 => Event::SentenceStart,
            351 => Event::SentenceEnd,
            352 => Event::TtsResponse,
            _ => return None,
        };
        Some(event)
    }

    /// Session-scoped events carry a length-prefixed session id after the
    /// event code. Codes below 100 are connection-level.
    pub fn is_session_scoped(self) -> bool {
        self.code() >= 100
    }

    /// Connection lifecycle replies carry a connection id instead of a
    /// session id.
    pub fn carries_connection_id(self) -> bool {
        matches!(self, Event::ConnectionStarted | Event::ConnectionFailed)
    }
}

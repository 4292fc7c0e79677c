use wire::frame::{FLAG_WITH_EVENT, HEADER_WORDS, PROTOCOL_VERSION, SERIALIZATION_JSON};
use wire::{decode, encode, DecodeError, Event, MessageType};

/// Build a server-side frame by hand, independent of `encode`.
fn server_frame(ty: MessageType, event: Event, id: Option<&str>, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![
        PROTOCOL_VERSION << 4 | HEADER_WORDS,
        ty.bits() << 4 | FLAG_WITH_EVENT,
        SERIALIZATION_JSON << 4,
        0x00,
    ];
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

fn error_frame(code: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![
        PROTOCOL_VERSION << 4 | HEADER_WORDS,
        MessageType::Error.bits() << 4,
        SERIALIZATION_JSON << 4,
        0x00,
    ];
    buf.extend_from_slice(&code.to_be_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

#[test]
fn roundtrip_client_events() {
    let cases = [
        (Event::StartConnection, None),
        (Event::FinishConnection, None),
        (Event::StartSession, Some("f81d4fae-7dec-11d0-a765-00a0c91e6bf6")),
        (Event::FinishSession, Some("f81d4fae-7dec-11d0-a765-00a0c91e6bf6")),
        (Event::TaskRequest, Some("f81d4fae-7dec-11d0-a765-00a0c91e6bf6")),
    ];
    for (event, sid) in cases {
        let payload = br#"{"text":"hello"}"#;
        let frame = decode(&encode(event, sid, payload)).unwrap();
        assert_eq!(frame.message_type, MessageType::FullClientRequest);
        assert_eq!(frame.event, Some(event));
        assert_eq!(frame.session_id.as_deref(), sid);
        assert_eq!(frame.payload, payload);
        assert_eq!(frame.error_code, None);
    }
}

#[test]
fn roundtrip_empty_session_id_and_payload() {
    let frame = decode(&encode(Event::StartSession, Some(""), b"")).unwrap();
    assert_eq!(frame.event, Some(Event::StartSession));
    assert_eq!(frame.session_id.as_deref(), Some(""));
    assert!(frame.payload.is_empty());

    let frame = decode(&encode(Event::StartConnection, None, b"")).unwrap();
    assert_eq!(frame.session_id, None);
    assert!(frame.payload.is_empty());
}

#[test]
fn short_frames_rejected() {
    for len in 0..4 {
        let bytes = vec![0x11; len];
        assert_eq!(decode(&bytes), Err(DecodeError::FrameTooShort(len)));
    }
}

#[test]
fn header_bit_layout() {
    let bytes = encode(Event::StartConnection, None, b"{}");
    assert_eq!(bytes[0], 0b0001_0001); // version 1, one header word
    assert_eq!(bytes[1], 0b0001_0100); // FullClientRequest, WithEvent
    assert_eq!(bytes[2], 0b0001_0000); // JSON, no compression
    assert_eq!(bytes[3], 0x00);
    assert_eq!(&bytes[4..8], &1i32.to_be_bytes()); // StartConnection
    assert_eq!(&bytes[8..12], &2u32.to_be_bytes()); // payload length
    assert_eq!(&bytes[12..], b"{}");
}

#[test]
fn decodes_server_control_frame() {
    let bytes = server_frame(
        MessageType::FullServerResponse,
        Event::SessionStarted,
        Some("sess-1"),
        b"{}",
    );
    let frame = decode(&bytes).unwrap();
    assert_eq!(frame.message_type, MessageType::FullServerResponse);
    assert_eq!(frame.event, Some(Event::SessionStarted));
    assert_eq!(frame.session_id.as_deref(), Some("sess-1"));
    assert_eq!(frame.connection_id, None);
    assert_eq!(frame.payload, b"{}");
}

#[test]
fn decodes_audio_frame() {
    let audio = [0x01, 0x02, 0x03, 0xff];
    let bytes = server_frame(
        MessageType::AudioOnlyResponse,
        Event::TtsResponse,
        Some("sess-1"),
        &audio,
    );
    let frame = decode(&bytes).unwrap();
    assert_eq!(frame.message_type, MessageType::AudioOnlyResponse);
    assert_eq!(frame.event, Some(Event::TtsResponse));
    assert_eq!(frame.payload, audio);
}

#[test]
fn decodes_connection_started_with_connection_id() {
    let bytes = server_frame(
        MessageType::FullServerResponse,
        Event::ConnectionStarted,
        Some("conn-42"),
        b"{}",
    );
    let frame = decode(&bytes).unwrap();
    assert_eq!(frame.event, Some(Event::ConnectionStarted));
    assert_eq!(frame.connection_id.as_deref(), Some("conn-42"));
    assert_eq!(frame.session_id, None);
}

#[test]
fn decodes_error_frame() {
    let bytes = error_frame(55_000_001, b"invalid voice");
    let frame = decode(&bytes).unwrap();
    assert_eq!(frame.message_type, MessageType::Error);
    assert_eq!(frame.event, None);
    assert_eq!(frame.error_code, Some(55_000_001));
    assert_eq!(frame.payload_text(), "invalid voice");
}

#[test]
fn rejects_unknown_event_code() {
    let mut bytes = vec![0x11, 0b1001_0100, 0x10, 0x00];
    bytes.extend_from_slice(&9999i32.to_be_bytes());
    bytes.extend_from_slice(&0u32.to_be_bytes());
    assert_eq!(decode(&bytes), Err(DecodeError::UnknownEvent(9999)));
}

#[test]
fn rejects_truncated_payload() {
    let mut bytes = server_frame(
        MessageType::AudioOnlyResponse,
        Event::TtsResponse,
        Some("s"),
        b"abc",
    );
    bytes.truncate(bytes.len() - 2);
    assert_eq!(decode(&bytes), Err(DecodeError::Truncated("payload")));
}

#[test]
fn event_flag_unset_means_no_event() {
    let mut bytes = vec![0x11, 0b1001_0000, 0x10, 0x00];
    bytes.extend_from_slice(&2u32.to_be_bytes());
    bytes.extend_from_slice(b"{}");
    let frame = decode(&bytes).unwrap();
    assert_eq!(frame.event, None);
    assert_eq!(frame.payload, b"{}");
}

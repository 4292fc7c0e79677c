//! Binary frame codec for the synthesis engine's streaming protocol.
//!
//! Every message on the wire is one [`Frame`]: a 4-byte header, an optional
//! big-endian event code, an optional length-prefixed session or connection
//! id, and a length-prefixed payload. The payload is either a JSON control
//! document or raw audio bytes depending on the message type.
//!
//! This crate is I/O free; it only maps between byte buffers and [`Frame`]
//! values. The `speech` crate drives it over a live connection.

pub mod event;
pub mod frame;

pub use event::Event;
pub use frame::{decode, encode, DecodeError, Frame, MessageType};

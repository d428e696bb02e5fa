//! Wire protocol for the showdown client.
//!
//! This crate defines how the server's text protocol is taken apart and
//! put back together:
//!
//! - **Frames** ([`decode_frame`], [`encode_frame`], [`encode_output`]) —
//!   one transport frame in, an ordered list of `(room_id, line)` pairs out;
//!   a batch of commands in, one outbound frame out.
//! - **Events** ([`parse_event`], [`Event`]) — one pipe-delimited line in,
//!   an event type and its parameters out.
//! - **Identities** ([`normalize_id`]) — display names folded into the
//!   stable lowercase ids used as map keys everywhere else.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw text frames) and the
//! room/session layers. It holds no state: every function here is pure.
//!
//! ```text
//! Transport (frame) → decode_frame → (room, line)* → parse_event → Event
//! ```

mod error;
mod event;
mod frame;
mod id;

pub use error::ProtocolError;
pub use event::{parse_event, Event, DELIMITER, RAW_TEXT};
pub use frame::{
    decode_frame, encode_frame, encode_output, Frame, CONNECT_FRAME,
    DEFAULT_ROOM, ROOM_MARKER,
};
pub use id::normalize_id;

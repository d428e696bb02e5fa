//! Transport frame decoding and encoding.
//!
//! Inbound frames come in two shapes:
//!
//! 1. The connect sentinel [`CONNECT_FRAME`] (`o`), sent once when the
//!    connection is established.
//! 2. An array frame: a JSON array of *blocks*, optionally prefixed with
//!    `a`. Each block is a string of newline-separated lines. If the first
//!    line starts with [`ROOM_MARKER`] the rest of that line names the
//!    room the following lines belong to; otherwise every line belongs to
//!    [`DEFAULT_ROOM`].
//!
//! Outbound frames are JSON arrays of command strings.

use crate::ProtocolError;

/// Frame sent by the server when the connection opens.
pub const CONNECT_FRAME: &str = "o";

/// Room that unmarked blocks (and the empty room id) belong to.
pub const DEFAULT_ROOM: &str = "lobby";

/// Prefix of the first line of a block that names its room.
pub const ROOM_MARKER: char = '>';

/// Optional prefix in front of an array frame's JSON body.
const ARRAY_PREFIX: char = 'a';

/// Longest excerpt of a bad frame kept in an error.
const EXCERPT_LEN: usize = 64;

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The connection is established. Carries no events.
    Connected,
    /// Events in wire order, each tagged with its room id.
    Events(Vec<(String, String)>),
}

/// Decodes one raw transport frame.
///
/// Order is preserved exactly: blocks in array order, lines in block
/// order. Later lines may depend on state set up by earlier ones.
///
/// # Errors
///
/// - [`ProtocolError::UnexpectedFrame`] for any frame that is neither the
///   connect sentinel nor an array frame.
/// - [`ProtocolError::Decode`] when the array body is not a JSON list of
///   strings.
pub fn decode_frame(raw: &str) -> Result<Frame, ProtocolError> {
    if raw == CONNECT_FRAME {
        return Ok(Frame::Connected);
    }

    let body = raw.strip_prefix(ARRAY_PREFIX).unwrap_or(raw);
    if !body.starts_with('[') {
        return Err(ProtocolError::UnexpectedFrame(
            raw.chars().take(EXCERPT_LEN).collect(),
        ));
    }

    let blocks: Vec<String> =
        serde_json::from_str(body).map_err(ProtocolError::Decode)?;

    let mut events = Vec::new();
    for block in &blocks {
        let mut lines = block.lines().peekable();
        let room_id = match lines.peek().and_then(|l| l.strip_prefix(ROOM_MARKER)) {
            Some(id) => {
                let id = if id.is_empty() { DEFAULT_ROOM } else { id };
                lines.next();
                id
            }
            None => DEFAULT_ROOM,
        };
        events.extend(lines.map(|line| (room_id.to_string(), line.to_string())));
    }

    Ok(Frame::Events(events))
}

/// Encodes `(room_id, line)` pairs into an array frame.
///
/// Consecutive pairs for the same room share one block, and every block
/// carries an explicit room marker, so [`decode_frame`] gives the same
/// pairs back. Lines must not contain newlines.
pub fn encode_frame<R, L>(events: &[(R, L)]) -> Result<String, ProtocolError>
where
    R: AsRef<str>,
    L: AsRef<str>,
{
    let mut blocks: Vec<(String, String)> = Vec::new();
    for (room, line) in events {
        let (room, line) = (room.as_ref(), line.as_ref());
        match blocks.last_mut() {
            Some((current, block)) if current == room => {
                block.push('\n');
                block.push_str(line);
            }
            _ => blocks.push((room.to_string(), format!("{ROOM_MARKER}{room}\n{line}"))),
        }
    }
    let bodies: Vec<String> = blocks.into_iter().map(|(_, block)| block).collect();
    let json = serde_json::to_string(&bodies).map_err(ProtocolError::Encode)?;
    Ok(format!("{ARRAY_PREFIX}{json}"))
}

/// Encodes a batch of outbound commands as one frame.
pub fn encode_output<S: AsRef<str>>(commands: &[S]) -> Result<String, ProtocolError> {
    let commands: Vec<&str> = commands.iter().map(AsRef::as_ref).collect();
    serde_json::to_string(&commands).map_err(ProtocolError::Encode)
}

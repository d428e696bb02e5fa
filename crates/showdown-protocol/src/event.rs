//! Pipe-delimited event parsing.
//!
//! A protocol line looks like `|type|param|param|...`. The leading `|`
//! means the first field is always empty, the second is the event type,
//! and everything after that are parameters. A line with no `|` at all
//! is plain text the server wants displayed as-is.

use crate::ProtocolError;

/// Field delimiter of the line protocol.
pub const DELIMITER: char = '|';

/// Event type given to lines that contain no delimiter.
pub const RAW_TEXT: &str = "rawtext";

/// Event type of timestamped chat messages.
const TIMESTAMPED_CHAT: &str = "c:";

/// One parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Lowercased event type, e.g. `j`, `title`, `c:`.
    pub kind: String,
    /// Parameters in wire order.
    pub params: Vec<String>,
    /// Server timestamp carried by `c:` lines, in seconds.
    pub timestamp: Option<i64>,
}

impl Event {
    /// Returns parameter `index`, or a [`ProtocolError::MalformedEvent`]
    /// when the line was too short.
    pub fn param(&self, index: usize) -> Result<&str, ProtocolError> {
        self.params
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| ProtocolError::MalformedEvent {
                kind: self.kind.clone(),
                index,
            })
    }

    /// Re-joins parameters `from..` with the delimiter.
    ///
    /// Free-text trailing fields (chat bodies, JSON payloads) may contain
    /// `|` themselves; splitting the line cut them apart and this puts
    /// them back together.
    pub fn rest(&self, from: usize) -> String {
        self.params
            .get(from..)
            .map(|tail| tail.join("|"))
            .unwrap_or_default()
    }
}

/// Parses one raw protocol line.
///
/// Surrounding whitespace is trimmed first. Lines without a delimiter
/// become a [`RAW_TEXT`] event whose only parameter is the whole line.
/// For `c:` lines the third field is the server timestamp; it is moved
/// into [`Event::timestamp`] so the parameters start at the author.
pub fn parse_event(line: &str) -> Event {
    let line = line.trim();
    let mut fields = line.split(DELIMITER);
    // The first field is empty by construction of the wire format.
    let _ = fields.next();

    let Some(kind) = fields.next() else {
        return Event {
            kind: RAW_TEXT.to_string(),
            params: vec![line.to_string()],
            timestamp: None,
        };
    };

    let kind = kind.to_lowercase();
    let mut params: Vec<String> = fields.map(str::to_string).collect();
    let mut timestamp = None;
    if kind == TIMESTAMPED_CHAT && !params.is_empty() {
        timestamp = params.remove(0).parse().ok();
    }

    tracing::trace!(%kind, params = params.len(), "parsed event");
    Event {
        kind,
        params,
        timestamp,
    }
}

//! Requests sent to the printer's request topic

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::Bytes;
use serde_json::{json, Map, Value};

/// Printer request commands
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Ask the printer to publish its complete status object
    PushAll,
}

impl Command {
    /// JSON object the command is nested under
    pub fn group(self) -> &'static str {
        match self {
            Self::PushAll => "pushing",
        }
    }

    /// Command name on the wire
    pub fn name(self) -> &'static str {
        match self {
            Self::PushAll => "pushall",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group(), self.name())
    }
}

/// A request ready to publish
///
/// # Examples
///
/// ```
/// use printwatch_core::Request;
///
/// let payload = Request::push_all(7).encode();
/// let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
///
/// assert_eq!(value["pushing"]["command"], "pushall");
/// assert_eq!(value["pushing"]["sequence_id"], "7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: Command,
    pub sequence_id: u32,
}

impl Request {
    pub fn new(command: Command, sequence_id: u32) -> Self {
        Self { command, sequence_id }
    }

    /// Full status request
    pub fn push_all(sequence_id: u32) -> Self {
        Self::new(Command::PushAll, sequence_id)
    }

    /// Encode to the JSON payload the printer expects
    pub fn encode(&self) -> Bytes {
        let mut body = Map::new();
        body.insert(
            self.command.group().to_string(),
            json!({
                "sequence_id": self.sequence_id.to_string(),
                "command": self.command.name(),
            }),
        );

        Bytes::from(Value::Object(body).to_string())
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request[{}](seq={})", self.command, self.sequence_id)
    }
}

/// Per-printer request sequence counter
///
/// Starts at 0 and wraps on overflow.
#[derive(Debug, Default)]
pub struct Sequence {
    next: AtomicU32,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get next sequence id
    pub fn next_id(&self) -> u32 {
        self.next.fetch_add(1, Ordering::AcqRel)
    }

    /// Build the next full status request
    pub fn push_all(&self) -> Request {
        Request::push_all(self.next_id())
    }
}

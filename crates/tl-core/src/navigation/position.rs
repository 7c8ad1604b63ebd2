use serde::{Serialize, Deserialize};
use crate::time::Time;

/// Position of a message within its topic.
///
/// Messages sharing a timestamp are ordered by `sequence` (arrival order),
/// so stepping by cursor always makes progress across duplicate times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageCursor {
    pub time: Time,
    pub sequence: u64,
}

impl MessageCursor {
    pub fn new(time: Time, sequence: u64) -> Self {
        Self { time, sequence }
    }
}

/// Where a session currently stands.
///
/// A playhead either sits on a resolved message or at a bare time (an
/// external seek). A bare time lies after every message stamped with it when
/// looking backward, and before all of them when looking forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playhead {
    pub time: Time,
    pub sequence: Option<u64>,
}

impl Playhead {
    pub fn at_message(cursor: MessageCursor) -> Self {
        Self {
            time: cursor.time,
            sequence: Some(cursor.sequence),
        }
    }

    pub fn at_time(time: Time) -> Self {
        Self { time, sequence: None }
    }

    /// Cursor to resolve the next message from
    pub fn after_cursor(&self) -> MessageCursor {
        MessageCursor::new(self.time, self.sequence.unwrap_or(u64::MAX))
    }

    /// Cursor to resolve the previous message from
    pub fn before_cursor(&self) -> MessageCursor {
        MessageCursor::new(self.time, self.sequence.unwrap_or(0))
    }
}

/// A resolved message reference as returned by a message source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub topic: String,
    pub cursor: MessageCursor,
}

impl Message {
    pub fn new(topic: impl Into<String>, cursor: MessageCursor) -> Self {
        Self {
            topic: topic.into(),
            cursor,
        }
    }

    /// Timestamp of the message
    pub fn time(&self) -> Time {
        self.cursor.time
    }
}

/// Direction of a navigation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Next => "next",
            Direction::Previous => "previous",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

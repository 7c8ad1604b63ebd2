use serde::{Serialize, Deserialize};
use uuid::Uuid;

mod engine;
mod position;
mod state;
mod subscriber;

pub use engine::TopicNavigator;
pub use position::{Direction, Message, MessageCursor, Playhead};
pub use state::{NavigationPhase, NavigationState};
pub use subscriber::NavigationSubscriber;

use crate::time::Time;

/// Session identifier
pub type SessionId = Uuid;

/// Result of a navigation step that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The playhead moved onto this message
    Moved(MessageCursor),
    /// The source had no message in the requested direction
    Exhausted,
    /// Navigation in that direction was not allowed; nothing changed
    Skipped,
    /// The session was reset while the request was in flight and the
    /// result was dropped
    Superseded,
}

impl NavigationOutcome {
    pub fn moved_to(&self) -> Option<MessageCursor> {
        match self {
            NavigationOutcome::Moved(cursor) => Some(*cursor),
            _ => None,
        }
    }
}

/// Snapshot handed to subscribers after every state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationContext {
    pub session_id: SessionId,
    pub incarnation: u64,
    pub topic: String,
    pub current_time: Option<Time>,
    pub is_navigating: bool,
    pub can_navigate_next: bool,
    pub can_navigate_previous: bool,
}

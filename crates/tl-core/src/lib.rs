//! Core functionality for stepping through recorded topic messages
//!
//! This crate provides the time model, the shared per-topic boundary
//! tracker and the navigator that moves a session from message to message.

pub mod boundaries;
pub mod config;
pub mod error;
pub mod navigation;
pub mod source;
pub mod time;

// Re-export commonly used types
pub use boundaries::{BoundaryTracker, TopicBoundaries};
pub use config::NavigatorConfig;
pub use error::{ConfigError, NavigationError, SourceError};
pub use navigation::{
    Direction, Message, MessageCursor, NavigationContext, NavigationOutcome, NavigationPhase,
    NavigationState, NavigationSubscriber, Playhead, SessionId, TopicNavigator,
};
pub use source::MessageSource;
pub use time::Time;

//! Navigation subscriber trait

use super::NavigationContext;

/// Trait for components that follow a session, e.g. a player seeking to the
/// focused message or a toolbar enabling its buttons
pub trait NavigationSubscriber: Send + Sync {
    /// Called after every change of position, in-flight flag or availability
    fn on_navigation_change(&self, context: &NavigationContext);
}

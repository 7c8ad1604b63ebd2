//! Per-session navigation state and flag derivation

use serde::{Serialize, Deserialize};
use crate::boundaries::TopicBoundaries;
use crate::time::Time;
use super::{Direction, MessageCursor, Playhead};

/// The two states of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationPhase {
    Idle,
    Navigating,
}

/// Navigation state of one session.
///
/// The `can_navigate_*` flags are derived and recomputed after every
/// transition, so they are never stale relative to the playhead, the
/// in-flight flag or the boundaries they were computed from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationState {
    current: Option<Playhead>,
    is_navigating: bool,
    can_navigate_next: bool,
    can_navigate_previous: bool,
    /// Last boundary seen when the source ran out of messages going forward
    next_exhausted_at: Option<Option<Time>>,
    /// First boundary seen when the source ran out of messages going backward
    previous_exhausted_at: Option<Option<Time>>,
    closed: bool,
}

impl NavigationState {
    pub fn new(current: Option<Playhead>, bounds: &TopicBoundaries) -> Self {
        let mut state = Self {
            current,
            ..Self::default()
        };
        state.recompute(bounds);
        state
    }

    pub fn current(&self) -> Option<Playhead> {
        self.current
    }

    pub fn current_time(&self) -> Option<Time> {
        self.current.map(|playhead| playhead.time)
    }

    pub fn is_navigating(&self) -> bool {
        self.is_navigating
    }

    pub fn can_navigate_next(&self) -> bool {
        self.can_navigate_next
    }

    pub fn can_navigate_previous(&self) -> bool {
        self.can_navigate_previous
    }

    /// A closed session never navigates again
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn can_navigate(&self, direction: Direction) -> bool {
        match direction {
            Direction::Next => self.can_navigate_next,
            Direction::Previous => self.can_navigate_previous,
        }
    }

    pub fn phase(&self) -> NavigationPhase {
        if self.is_navigating {
            NavigationPhase::Navigating
        } else {
            NavigationPhase::Idle
        }
    }

    /// Re-derive both flags from `bounds`
    pub fn recompute(&mut self, bounds: &TopicBoundaries) {
        let current = self.current_time();
        let open = !self.closed && !self.is_navigating;

        self.can_navigate_next = open
            && match bounds.last {
                Some(last) => current.map_or(true, |time| time < last),
                None => false,
            }
            && !still_exhausted(self.next_exhausted_at, bounds.last, |now, seen| now > seen);

        self.can_navigate_previous = open
            && match bounds.first {
                Some(first) => current.map_or(true, |time| time > first),
                None => false,
            }
            && !still_exhausted(self.previous_exhausted_at, bounds.first, |now, seen| now < seen);
    }

    /// Idle -> Navigating
    pub(crate) fn begin(&mut self, bounds: &TopicBoundaries) {
        self.is_navigating = true;
        self.recompute(bounds);
    }

    /// Navigating -> Idle, positioned on `cursor`
    pub(crate) fn finish_moved(&mut self, cursor: MessageCursor, bounds: &TopicBoundaries) {
        self.current = Some(Playhead::at_message(cursor));
        self.is_navigating = false;
        self.clear_exhaustion();
        self.recompute(bounds);
    }

    /// Navigating -> Idle, the source had no message in `direction`
    pub(crate) fn finish_exhausted(&mut self, direction: Direction, bounds: &TopicBoundaries) {
        match direction {
            Direction::Next => self.next_exhausted_at = Some(bounds.last),
            Direction::Previous => self.previous_exhausted_at = Some(bounds.first),
        }
        self.is_navigating = false;
        self.recompute(bounds);
    }

    /// Navigating -> Idle with the position unchanged
    pub(crate) fn finish_unchanged(&mut self, bounds: &TopicBoundaries) {
        self.is_navigating = false;
        self.recompute(bounds);
    }

    /// Move the playhead from outside the navigator
    pub(crate) fn seek(&mut self, playhead: Option<Playhead>, bounds: &TopicBoundaries) {
        self.current = playhead;
        self.is_navigating = false;
        self.clear_exhaustion();
        self.recompute(bounds);
    }

    /// Any state -> Idle, with both directions disabled for good
    pub(crate) fn close(&mut self, bounds: &TopicBoundaries) {
        self.closed = true;
        self.is_navigating = false;
        self.recompute(bounds);
    }

    fn clear_exhaustion(&mut self) {
        self.next_exhausted_at = None;
        self.previous_exhausted_at = None;
    }
}

/// A direction stays exhausted until its boundary widens past the one seen
/// when the source came up empty.
fn still_exhausted(
    marker: Option<Option<Time>>,
    bound: Option<Time>,
    widened: impl Fn(Time, Time) -> bool,
) -> bool {
    match marker {
        None => false,
        Some(seen) => match (bound, seen) {
            (Some(now), Some(seen)) => !widened(now, seen),
            (Some(_), None) => false,
            (None, _) => true,
        },
    }
}

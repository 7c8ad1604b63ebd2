//! Known time extent of each topic

use std::sync::Arc;
use parking_lot::RwLock;
use ahash::AHashMap;
use serde::{Serialize, Deserialize};
use crate::time::Time;

/// Earliest and latest known message time of a topic.
///
/// `None` means the bound has not been discovered yet. When both bounds are
/// present `first <= last` holds, since bounds only ever widen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicBoundaries {
    pub first: Option<Time>,
    pub last: Option<Time>,
}

impl TopicBoundaries {
    /// Boundaries spanning `[first, last]`, ordering the arguments if needed
    pub fn spanning(a: Time, b: Time) -> Self {
        Self {
            first: Some(a.min(b)),
            last: Some(a.max(b)),
        }
    }

    /// Widen to include `time`
    pub fn observe(&mut self, time: Time) {
        self.first = Some(self.first.map_or(time, |first| first.min(time)));
        self.last = Some(self.last.map_or(time, |last| last.max(time)));
    }

    /// Widen by whichever bounds `other` knows about
    pub fn merge(&mut self, other: &TopicBoundaries) {
        if let Some(first) = other.first {
            self.first = Some(self.first.map_or(first, |current| current.min(first)));
        }
        if let Some(last) = other.last {
            self.last = Some(self.last.map_or(last, |current| current.max(last)));
        }
    }

    /// No bound is known
    pub fn is_empty(&self) -> bool {
        self.first.is_none() && self.last.is_none()
    }

    /// Whether `time` lies inside both known bounds
    pub fn contains(&self, time: Time) -> bool {
        self.first.map_or(true, |first| first <= time)
            && self.last.map_or(true, |last| time <= last)
    }
}

/// Shared per-topic boundary registry.
///
/// Readers and observers may run concurrently from any task; observations
/// only widen the stored boundaries.
#[derive(Debug, Clone, Default)]
pub struct BoundaryTracker {
    topics: Arc<RwLock<AHashMap<String, TopicBoundaries>>>,
}

impl BoundaryTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a message of `topic` exists at `time`
    pub fn observe(&self, topic: &str, time: Time) {
        let mut topics = self.topics.write();
        match topics.get_mut(topic) {
            Some(bounds) => bounds.observe(time),
            None => {
                let mut bounds = TopicBoundaries::default();
                bounds.observe(time);
                topics.insert(topic.to_string(), bounds);
            }
        }
    }

    /// Merge a partial discovery (e.g. only the first message was found)
    pub fn observe_boundaries(&self, topic: &str, discovered: TopicBoundaries) {
        if discovered.is_empty() {
            return;
        }
        self.topics
            .write()
            .entry(topic.to_string())
            .or_default()
            .merge(&discovered);
    }

    /// Snapshot of a topic's boundaries; empty if the topic is unknown
    pub fn boundaries_for(&self, topic: &str) -> TopicBoundaries {
        self.topics.read().get(topic).copied().unwrap_or_default()
    }

    /// Topics with at least one known bound
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.read().keys().cloned().collect();
        topics.sort();
        topics
    }

    pub fn len(&self) -> usize {
        self.topics.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.read().is_empty()
    }
}

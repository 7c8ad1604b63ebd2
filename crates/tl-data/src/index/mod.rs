//! In-memory per-topic message index

use std::sync::Arc;
use async_trait::async_trait;
use parking_lot::RwLock;
use ahash::AHashMap;
use tl_core::{
    BoundaryTracker, Message, MessageCursor, MessageSource, SourceError, Time, TopicBoundaries,
};
use crate::sources::{RangeSource, TopicStats};
use crate::DataError;

#[derive(Default)]
struct IndexState {
    /// Cursors per topic, sorted by (time, sequence)
    topics: AHashMap<String, Vec<MessageCursor>>,
    next_sequence: u64,
}

/// Index of message timestamps for efficient navigation.
///
/// Every inserted message gets the next arrival sequence number, which
/// orders messages sharing a timestamp.
#[derive(Clone, Default)]
pub struct MessageIndex {
    state: Arc<RwLock<IndexState>>,
    tracker: Option<BoundaryTracker>,
}

impl MessageIndex {
    /// Create a new, empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index that reports every insert to `tracker`
    pub fn with_tracker(tracker: BoundaryTracker) -> Self {
        Self {
            state: Arc::default(),
            tracker: Some(tracker),
        }
    }

    /// Add a message of `topic` at `time`
    pub fn insert(&self, topic: &str, time: Time) -> MessageCursor {
        let cursor = {
            let mut state = self.state.write();
            let cursor = MessageCursor::new(time, state.next_sequence);
            state.next_sequence += 1;

            let entries = state.topics.entry(topic.to_string()).or_default();
            let position = entries.partition_point(|existing| *existing < cursor);
            entries.insert(position, cursor);
            cursor
        };

        if let Some(tracker) = &self.tracker {
            tracker.observe(topic, time);
        }
        cursor
    }

    /// Add several messages of `topic`, in arrival order
    pub fn extend(&self, topic: &str, times: impl IntoIterator<Item = Time>) -> Vec<MessageCursor> {
        times.into_iter().map(|time| self.insert(topic, time)).collect()
    }

    /// Total number of indexed messages
    pub fn len(&self) -> usize {
        self.state.read().topics.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of messages of one topic
    pub fn topic_len(&self, topic: &str) -> usize {
        self.state.read().topics.get(topic).map_or(0, Vec::len)
    }

    /// Indexed topic names
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.state.read().topics.keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Statistics of one topic; `None` if the topic has no messages
    pub fn stats(&self, topic: &str) -> Option<TopicStats> {
        let state = self.state.read();
        let entries = state.topics.get(topic).filter(|entries| !entries.is_empty())?;
        Some(TopicStats {
            num_messages: entries.len(),
            first: entries.first().map(|cursor| cursor.time),
            last: entries.last().map(|cursor| cursor.time),
        })
    }

    /// Messages with `start <= time < end`
    pub fn range(&self, topic: &str, start: Option<Time>, end: Option<Time>) -> Vec<Message> {
        let state = self.state.read();
        let Some(entries) = state.topics.get(topic) else {
            return Vec::new();
        };

        let lo = start.map_or(0, |start| entries.partition_point(|c| c.time < start));
        let hi = end.map_or(entries.len(), |end| entries.partition_point(|c| c.time < end));
        if lo >= hi {
            return Vec::new();
        }
        entries[lo..hi].iter().map(|cursor| Message::new(topic, *cursor)).collect()
    }

    /// First message strictly after `after`
    pub fn find_after(&self, topic: &str, after: Option<MessageCursor>) -> Option<Message> {
        let state = self.state.read();
        let entries = state.topics.get(topic)?;
        let position = after.map_or(0, |after| entries.partition_point(|c| *c <= after));
        entries.get(position).map(|cursor| Message::new(topic, *cursor))
    }

    /// Last message strictly before `before`
    pub fn find_before(&self, topic: &str, before: Option<MessageCursor>) -> Option<Message> {
        let state = self.state.read();
        let entries = state.topics.get(topic)?;
        let position =
            before.map_or(entries.len(), |before| entries.partition_point(|c| *c < before));
        position
            .checked_sub(1)
            .and_then(|idx| entries.get(idx))
            .map(|cursor| Message::new(topic, *cursor))
    }
}

#[async_trait]
impl MessageSource for MessageIndex {
    async fn resolve_after(
        &self,
        topic: &str,
        after: Option<MessageCursor>,
    ) -> Result<Option<Message>, SourceError> {
        Ok(self.find_after(topic, after))
    }

    async fn resolve_before(
        &self,
        topic: &str,
        before: Option<MessageCursor>,
    ) -> Result<Option<Message>, SourceError> {
        Ok(self.find_before(topic, before))
    }

    async fn discover_boundaries(&self, topic: &str) -> Result<TopicBoundaries, SourceError> {
        Ok(self
            .stats(topic)
            .map(|stats| TopicBoundaries { first: stats.first, last: stats.last })
            .unwrap_or_default())
    }
}

#[async_trait]
impl RangeSource for MessageIndex {
    async fn messages_in_range(
        &self,
        topic: &str,
        start: Option<Time>,
        end: Option<Time>,
    ) -> Result<Vec<Message>, DataError> {
        Ok(self.range(topic, start, end))
    }

    async fn topic_stats(&self, topic: &str) -> Option<TopicStats> {
        self.stats(topic)
    }

    fn source_name(&self) -> &str {
        "memory"
    }
}

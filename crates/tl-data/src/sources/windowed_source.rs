use async_trait::async_trait;
use tracing::debug;
use tl_core::{
    BoundaryTracker, Message, MessageCursor, MessageSource, SourceError, Time, TopicBoundaries,
};
use crate::config::WindowConfig;
use crate::sources::{RangeSource, TopicStats};
use crate::window::{calculate_optimal_window_ms, create_window_sizes, would_reach_boundary};
use crate::DataError;

/// Message source built on time range queries.
///
/// Next message: one query from the current time onward. Previous message:
/// queries over progressively larger windows ending at the current time,
/// sized from the topic's density when the inner source reports statistics,
/// and a scan from the topic start once a window would reach the first
/// known message or every window came up empty.
pub struct WindowedSource<R> {
    inner: R,
    config: WindowConfig,
    tracker: Option<BoundaryTracker>,
}

impl<R: RangeSource> WindowedSource<R> {
    pub fn new(inner: R, config: WindowConfig) -> Self {
        Self {
            inner,
            config,
            tracker: None,
        }
    }

    /// Record boundaries discovered while searching into `tracker`
    pub fn with_tracker(mut self, tracker: BoundaryTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    fn record(&self, topic: &str, discovered: TopicBoundaries) {
        if let Some(tracker) = &self.tracker {
            tracker.observe_boundaries(topic, discovered);
        }
    }

    async fn initial_window_ms(&self, topic: &str) -> f64 {
        match self.inner.topic_stats(topic).await {
            Some(stats) => match (stats.first, stats.last) {
                (Some(first), Some(last)) => {
                    calculate_optimal_window_ms(stats.num_messages, first, last, &self.config)
                }
                _ => self.config.default_window_ms,
            },
            None => self.config.default_window_ms,
        }
    }

    /// Boundaries of `topic` from the inner source's statistics, or from a
    /// scan over all of its messages when there are none
    async fn scan_boundaries(&self, topic: &str) -> Result<TopicBoundaries, DataError> {
        let discovered = match self.inner.topic_stats(topic).await {
            Some(TopicStats { first: Some(first), last: Some(last), .. }) => {
                TopicBoundaries::spanning(first, last)
            }
            _ => {
                debug!("No statistics for '{}', scanning all of its messages", topic);
                let messages = self.inner.messages_in_range(topic, None, None).await?;
                TopicBoundaries {
                    first: messages.first().map(Message::time),
                    last: messages.last().map(Message::time),
                }
            }
        };
        self.record(topic, discovered);
        Ok(discovered)
    }

    /// Last message before `before` among messages from `start` up to and
    /// including `before.time`
    async fn last_before(
        &self,
        topic: &str,
        start: Option<Time>,
        before: MessageCursor,
    ) -> Result<(Option<Message>, Option<Time>), DataError> {
        let end = Time::from_nanos(before.time.as_nanos().saturating_add(1));
        let messages = self.inner.messages_in_range(topic, start, Some(end)).await?;
        let earliest = messages.first().map(Message::time);
        let found = messages.into_iter().rev().find(|message| message.cursor < before);
        Ok((found, earliest))
    }

    async fn find_last(&self, topic: &str) -> Result<Option<Message>, DataError> {
        let start = self.inner.topic_stats(topic).await.and_then(|stats| stats.last);
        let messages = self.inner.messages_in_range(topic, start, None).await?;
        let last = messages.last().cloned();
        if start.is_none() {
            self.record(
                topic,
                TopicBoundaries {
                    first: messages.first().map(Message::time),
                    last: last.as_ref().map(Message::time),
                },
            );
        }
        Ok(last)
    }

    async fn find_before(
        &self,
        topic: &str,
        before: MessageCursor,
    ) -> Result<Option<Message>, DataError> {
        let known_first = self
            .tracker
            .as_ref()
            .and_then(|tracker| tracker.boundaries_for(topic).first);
        let windows = create_window_sizes(self.initial_window_ms(topic).await, &self.config);

        for window_ms in windows {
            if would_reach_boundary(before.time, window_ms, known_first) {
                // Last attempt: everything from the first known message
                let (found, _) = self.last_before(topic, known_first, before).await?;
                return Ok(found);
            }

            let window_start = before.time.saturating_sub_millis(window_ms);
            let (found, earliest) = self.last_before(topic, Some(window_start), before).await?;
            if window_start == Time::ZERO {
                self.record(topic, TopicBoundaries { first: earliest, last: None });
                return Ok(found);
            }
            if found.is_some() {
                return Ok(found);
            }
            debug!("No message on '{}' within {}ms before {}", topic, window_ms, before.time);
        }

        let (found, earliest) = self.last_before(topic, None, before).await?;
        self.record(topic, TopicBoundaries { first: earliest, last: None });
        Ok(found)
    }
}

#[async_trait]
impl<R: RangeSource> MessageSource for WindowedSource<R> {
    async fn resolve_after(
        &self,
        topic: &str,
        after: Option<MessageCursor>,
    ) -> Result<Option<Message>, SourceError> {
        let start = after.map(|cursor| cursor.time);
        let messages = self.inner.messages_in_range(topic, start, None).await?;
        let last = messages.last().map(Message::time);
        let found = messages
            .into_iter()
            .find(|message| after.map_or(true, |cursor| message.cursor > cursor));

        self.record(
            topic,
            TopicBoundaries {
                first: if after.is_none() { found.as_ref().map(Message::time) } else { None },
                last,
            },
        );
        Ok(found)
    }

    async fn resolve_before(
        &self,
        topic: &str,
        before: Option<MessageCursor>,
    ) -> Result<Option<Message>, SourceError> {
        let found = match before {
            Some(before) => self.find_before(topic, before).await?,
            None => self.find_last(topic).await?,
        };
        Ok(found)
    }

    async fn discover_boundaries(&self, topic: &str) -> Result<TopicBoundaries, SourceError> {
        Ok(self.scan_boundaries(topic).await?)
    }
}

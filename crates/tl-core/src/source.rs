//! The message source collaborator

use std::sync::Arc;
use async_trait::async_trait;
use crate::boundaries::TopicBoundaries;
use crate::error::SourceError;
use crate::navigation::{Message, MessageCursor};

/// Resolves adjacent messages of a topic.
///
/// Implementations order messages by [`MessageCursor`], i.e. by time and then
/// by arrival sequence. No timeout is applied by callers; slow sources are
/// expected to enforce their own policy.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Earliest message strictly after `after`, or the first message when
    /// `after` is `None`. `Ok(None)` when there is no such message.
    async fn resolve_after(
        &self,
        topic: &str,
        after: Option<MessageCursor>,
    ) -> Result<Option<Message>, SourceError>;

    /// Latest message strictly before `before`, or the last message when
    /// `before` is `None`. `Ok(None)` when there is no such message.
    async fn resolve_before(
        &self,
        topic: &str,
        before: Option<MessageCursor>,
    ) -> Result<Option<Message>, SourceError>;

    /// Times of the first and last message of `topic`, found without
    /// navigating. Sources that cannot tell report empty boundaries.
    async fn discover_boundaries(&self, _topic: &str) -> Result<TopicBoundaries, SourceError> {
        Ok(TopicBoundaries::default())
    }
}

#[async_trait]
impl<S: MessageSource + ?Sized> MessageSource for Arc<S> {
    async fn resolve_after(
        &self,
        topic: &str,
        after: Option<MessageCursor>,
    ) -> Result<Option<Message>, SourceError> {
        (**self).resolve_after(topic, after).await
    }

    async fn resolve_before(
        &self,
        topic: &str,
        before: Option<MessageCursor>,
    ) -> Result<Option<Message>, SourceError> {
        (**self).resolve_before(topic, before).await
    }

    async fn discover_boundaries(&self, topic: &str) -> Result<TopicBoundaries, SourceError> {
        (**self).discover_boundaries(topic).await
    }
}

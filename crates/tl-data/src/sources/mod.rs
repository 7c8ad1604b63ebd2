pub mod record_batch_source;
pub mod windowed_source;

pub use record_batch_source::RecordBatchSource;
pub use windowed_source::WindowedSource;

use async_trait::async_trait;
use tl_core::{Message, Time};
use crate::DataError;

/// Summary statistics of one topic, when a source knows them up front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicStats {
    pub num_messages: usize,
    pub first: Option<Time>,
    pub last: Option<Time>,
}

/// Trait for sources that answer time range queries over a topic
#[async_trait]
pub trait RangeSource: Send + Sync {
    /// Messages of `topic` with `start <= time < end`, in cursor order.
    /// An absent bound is unbounded.
    async fn messages_in_range(
        &self,
        topic: &str,
        start: Option<Time>,
        end: Option<Time>,
    ) -> Result<Vec<Message>, DataError>;

    /// Statistics of `topic`, if cheaply available
    async fn topic_stats(&self, _topic: &str) -> Option<TopicStats> {
        None
    }

    /// Get the source name
    fn source_name(&self) -> &str;
}

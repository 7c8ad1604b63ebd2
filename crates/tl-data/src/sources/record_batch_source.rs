use async_trait::async_trait;
use arrow::array::{Array, ArrayRef, Int64Array, StringArray, UInt32Array};
use arrow::record_batch::RecordBatch;
use ahash::AHashMap;
use tracing::debug;
use tl_core::{Message, MessageCursor, Time};
use crate::sources::{RangeSource, TopicStats};
use crate::DataError;

pub const TOPIC_COLUMN: &str = "topic";
pub const SEC_COLUMN: &str = "sec";
pub const NSEC_COLUMN: &str = "nsec";

/// Range source over timestamped records held in Arrow record batches.
///
/// Expects a `topic` (Utf8) column and `sec`/`nsec` columns (UInt32 or
/// Int64). The global row number across all batches is the message
/// sequence.
pub struct RecordBatchSource {
    name: String,
    /// Cursors per topic, sorted by (time, sequence)
    topics: AHashMap<String, Vec<MessageCursor>>,
    row_count: usize,
}

impl RecordBatchSource {
    /// Index a single batch
    pub fn from_batch(name: impl Into<String>, batch: &RecordBatch) -> Result<Self, DataError> {
        Self::from_batches(name, std::slice::from_ref(batch))
    }

    /// Index consecutive batches of one recording
    pub fn from_batches(
        name: impl Into<String>,
        batches: &[RecordBatch],
    ) -> Result<Self, DataError> {
        let mut topics: AHashMap<String, Vec<MessageCursor>> = AHashMap::new();
        let mut row_offset = 0usize;

        for batch in batches {
            let topic_column = column(batch, TOPIC_COLUMN)?;
            let topic_values = topic_column
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| DataError::ColumnType {
                    column: TOPIC_COLUMN.to_string(),
                    data_type: topic_column.data_type().clone(),
                })?;
            let secs = time_column(batch, SEC_COLUMN, row_offset)?;
            let nsecs = time_column(batch, NSEC_COLUMN, row_offset)?;

            for row in 0..batch.num_rows() {
                if topic_values.is_null(row) {
                    continue;
                }
                let time = Time::new(secs[row], nsecs[row]);
                let cursor = MessageCursor::new(time, (row_offset + row) as u64);
                topics
                    .entry(topic_values.value(row).to_string())
                    .or_default()
                    .push(cursor);
            }
            row_offset += batch.num_rows();
        }

        for cursors in topics.values_mut() {
            cursors.sort_unstable();
        }

        let name = name.into();
        debug!("Indexed {} rows of '{}' into {} topics", row_offset, name, topics.len());

        Ok(Self {
            name,
            topics,
            row_count: row_offset,
        })
    }

    /// Total rows indexed, including rows without a topic
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.keys().cloned().collect();
        topics.sort();
        topics
    }
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, DataError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DataError::MissingColumn(name.to_string()))
}

/// Read a seconds or nanoseconds column as `u32` values
fn time_column(batch: &RecordBatch, name: &str, row_offset: usize) -> Result<Vec<u32>, DataError> {
    let array = column(batch, name)?;
    let null_error = |row: usize| DataError::InvalidTime {
        row: row_offset + row,
        reason: format!("null {}", name),
    };

    if let Some(values) = array.as_any().downcast_ref::<UInt32Array>() {
        return (0..values.len())
            .map(|row| {
                if values.is_null(row) {
                    Err(null_error(row))
                } else {
                    Ok(values.value(row))
                }
            })
            .collect();
    }

    if let Some(values) = array.as_any().downcast_ref::<Int64Array>() {
        return (0..values.len())
            .map(|row| {
                if values.is_null(row) {
                    return Err(null_error(row));
                }
                let value = values.value(row);
                u32::try_from(value).map_err(|_| DataError::InvalidTime {
                    row: row_offset + row,
                    reason: format!("{} out of range: {}", name, value),
                })
            })
            .collect();
    }

    Err(DataError::ColumnType {
        column: name.to_string(),
        data_type: array.data_type().clone(),
    })
}

#[async_trait]
impl RangeSource for RecordBatchSource {
    async fn messages_in_range(
        &self,
        topic: &str,
        start: Option<Time>,
        end: Option<Time>,
    ) -> Result<Vec<Message>, DataError> {
        let Some(cursors) = self.topics.get(topic) else {
            return Ok(Vec::new());
        };
        let lo = start.map_or(0, |start| cursors.partition_point(|c| c.time < start));
        let hi = end.map_or(cursors.len(), |end| cursors.partition_point(|c| c.time < end));
        if lo >= hi {
            return Ok(Vec::new());
        }
        Ok(cursors[lo..hi].iter().map(|cursor| Message::new(topic, *cursor)).collect())
    }

    async fn topic_stats(&self, topic: &str) -> Option<TopicStats> {
        let cursors = self.topics.get(topic).filter(|cursors| !cursors.is_empty())?;
        Some(TopicStats {
            num_messages: cursors.len(),
            first: cursors.first().map(|c| c.time),
            last: cursors.last().map(|c| c.time),
        })
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Feedback sinks
///
/// The player hands every event to each registered sink. Sinks are
/// write-only: nothing in the ranking path reads them back.

use crate::db::models::FeedbackEvent;
use crate::db::Database;
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &str;

    async fn append(&self, event: &FeedbackEvent) -> Result<()>;
}

#[async_trait]
impl FeedbackSink for Database {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, event: &FeedbackEvent) -> Result<()> {
        self.record_feedback(event).await?;
        Ok(())
    }
}

/// Keeps events in memory; handy for tests and embedding
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<FeedbackEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far
    pub async fn events(&self) -> Vec<FeedbackEvent> {
        self.events.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }
}

#[async_trait]
impl FeedbackSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, event: &FeedbackEvent) -> Result<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Action;

    #[tokio::test]
    async fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        assert!(sink.is_empty().await);

        sink.append(&FeedbackEvent::now("u", "a", Action::Like, 0, 0))
            .await
            .unwrap();
        sink.append(&FeedbackEvent::now("u", "b", Action::Dislike, 0, 0))
            .await
            .unwrap();

        let events = sink.events().await;
        assert_eq!(sink.len().await, 2);
        assert_eq!(events[1].track_id, "b");
    }

    #[tokio::test]
    async fn test_database_as_sink() {
        let db = Database::new_test().await.unwrap();
        let sink: &dyn FeedbackSink = &db;

        sink.append(&FeedbackEvent::now("u", "a", Action::Replay, 10, 20))
            .await
            .unwrap();

        assert_eq!(sink.name(), "sqlite");
        assert_eq!(db.feedback_for_track("a").await.unwrap().len(), 1);
    }
}

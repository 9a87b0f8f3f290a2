/// SQL query functions for the feedback store

use crate::db::models::*;
use crate::db::Database;
use crate::error::Result;
use sqlx::Row;

impl Database {
    /// Store one feedback event
    ///
    /// # Returns
    /// * `Ok(i64)` - The row ID
    /// * `Err(SongSplayError)` - If the insert fails
    pub async fn record_feedback(&self, event: &FeedbackEvent) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO feedback_events (user_id, track_id, action, ms_listened, ms_track, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&event.user_id)
        .bind(&event.track_id)
        .bind(event.action.as_str())
        .bind(event.ms_listened)
        .bind(event.ms_track)
        .bind(event.timestamp)
        .fetch_one(self.pool())
        .await?;

        Ok(result.get(0))
    }

    /// Most recent events first
    ///
    /// # Arguments
    /// * `user_id` - Optional user filter (None for everyone)
    /// * `limit` - Maximum number of events to return
    pub async fn recent_feedback(
        &self,
        user_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<FeedbackRecord>> {
        let records = if let Some(user) = user_id {
            sqlx::query_as::<_, FeedbackRecord>(
                "SELECT * FROM feedback_events WHERE user_id = ? ORDER BY timestamp DESC, id DESC LIMIT ?",
            )
            .bind(user)
            .bind(limit)
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query_as::<_, FeedbackRecord>(
                "SELECT * FROM feedback_events ORDER BY timestamp DESC, id DESC LIMIT ?",
            )
            .bind(limit)
            .fetch_all(self.pool())
            .await?
        };

        Ok(records)
    }

    /// Every event of one user in the order it happened
    ///
    /// Used to restore a session's ranking state on startup.
    pub async fn feedback_history(&self, user_id: &str) -> Result<Vec<FeedbackRecord>> {
        let records = sqlx::query_as::<_, FeedbackRecord>(
            "SELECT * FROM feedback_events WHERE user_id = ? ORDER BY timestamp ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(records)
    }

    /// All events for one track, oldest first
    pub async fn feedback_for_track(&self, track_id: &str) -> Result<Vec<FeedbackRecord>> {
        let records = sqlx::query_as::<_, FeedbackRecord>(
            "SELECT * FROM feedback_events WHERE track_id = ? ORDER BY timestamp ASC, id ASC",
        )
        .bind(track_id)
        .fetch_all(self.pool())
        .await?;

        Ok(records)
    }

    /// Number of events per action, most frequent first
    pub async fn action_counts(&self, user_id: Option<&str>) -> Result<Vec<ActionCount>> {
        let counts = if let Some(user) = user_id {
            sqlx::query_as::<_, ActionCount>(
                r#"
                SELECT action, COUNT(*) AS count FROM feedback_events
                WHERE user_id = ?
                GROUP BY action ORDER BY count DESC, action ASC
                "#,
            )
            .bind(user)
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query_as::<_, ActionCount>(
                r#"
                SELECT action, COUNT(*) AS count FROM feedback_events
                GROUP BY action ORDER BY count DESC, action ASC
                "#,
            )
            .fetch_all(self.pool())
            .await?
        };

        Ok(counts)
    }
}

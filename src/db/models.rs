/// Data models for feedback events
///
/// `FeedbackEvent` is what the player emits; `FeedbackRecord` is the row
/// read back from SQLite.

use crate::core::Action;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One listener event, as written to every feedback sink
///
/// Field order is the CSV column order:
/// `user_id,track_id,action,ms_listened,ms_track,timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub user_id: String,
    pub track_id: String,
    pub action: Action,
    pub ms_listened: i64,
    pub ms_track: i64,
    pub timestamp: i64, // epoch milliseconds
}

impl FeedbackEvent {
    /// Event stamped with the current time
    pub fn now(
        user_id: impl Into<String>,
        track_id: impl Into<String>,
        action: Action,
        ms_listened: i64,
        ms_track: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            track_id: track_id.into(),
            action,
            ms_listened,
            ms_track,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Stored feedback row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackRecord {
    pub id: i64,
    pub user_id: String,
    pub track_id: String,
    pub action: String,
    pub ms_listened: i64,
    pub ms_track: i64,
    pub timestamp: i64,
    pub recorded_at: String, // ISO 8601 format from SQLite
}

impl FeedbackRecord {
    /// Parsed action; None for names this build doesn't know
    pub fn action(&self) -> Option<Action> {
        self.action.parse().ok()
    }

    /// Event time as a UTC datetime
    pub fn time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Fraction of the track that was heard, if the track length is known
    pub fn listened_fraction(&self) -> Option<f64> {
        if self.ms_track > 0 {
            Some((self.ms_listened as f64 / self.ms_track as f64).clamp(0.0, 1.0))
        } else {
            None
        }
    }
}

/// How often one action was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ActionCount {
    pub action: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(action: &str, ms_listened: i64, ms_track: i64) -> FeedbackRecord {
        FeedbackRecord {
            id: 1,
            user_id: "u".to_string(),
            track_id: "t".to_string(),
            action: action.to_string(),
            ms_listened,
            ms_track,
            timestamp: 1_700_000_000_000,
            recorded_at: "2023-11-14T22:13:20Z".to_string(),
        }
    }

    #[test]
    fn test_record_action_parse() {
        assert_eq!(record("LIKE", 0, 0).action(), Some(Action::Like));
        assert_eq!(record("SHUFFLE", 0, 0).action(), None);
    }

    #[test]
    fn test_listened_fraction() {
        assert_eq!(record("PLAY_COMPLETE", 90_000, 180_000).listened_fraction(), Some(0.5));
        assert_eq!(record("PLAY_COMPLETE", 500, 0).listened_fraction(), None);
        assert_eq!(record("REPLAY", 400, 200).listened_fraction(), Some(1.0));
    }

    #[test]
    fn test_record_time() {
        let time = record("LIKE", 0, 0).time().unwrap();
        assert_eq!(time.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_event_now_is_stamped() {
        let before = chrono::Utc::now().timestamp_millis();
        let event = FeedbackEvent::now("u1", "t1", Action::Like, 1200, 200_000);
        assert!(event.timestamp >= before);
        assert_eq!(event.action, Action::Like);
    }
}

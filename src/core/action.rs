/// Listener actions and the feedback each one carries

use crate::error::{Result, SongSplayError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Nominal delta of NOT_INTERESTED; never added to an accumulator
pub const NOT_INTERESTED_DELTA: i32 = -1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    PlayStart,
    PlayComplete,
    Replay,
    SkipEarly,
    SkipLate,
    Like,
    Dislike,
    NotInterested,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::PlayStart,
        Action::PlayComplete,
        Action::Replay,
        Action::SkipEarly,
        Action::SkipLate,
        Action::Like,
        Action::Dislike,
        Action::NotInterested,
    ];

    /// Feedback accumulator delta for this action
    pub fn delta(self) -> i32 {
        match self {
            Action::PlayStart => 0,
            Action::PlayComplete => 1,
            Action::Replay => 1,
            Action::SkipEarly => -3,
            Action::SkipLate => -1,
            Action::Like => 3,
            Action::Dislike => -4,
            Action::NotInterested => NOT_INTERESTED_DELTA,
        }
    }

    /// Whether this action takes the reset path instead of a delta
    pub fn is_reset(self) -> bool {
        self == Action::NotInterested
    }

    /// Name as written to the feedback log
    pub fn as_str(self) -> &'static str {
        match self {
            Action::PlayStart => "PLAY_START",
            Action::PlayComplete => "PLAY_COMPLETE",
            Action::Replay => "REPLAY",
            Action::SkipEarly => "SKIP_EARLY",
            Action::SkipLate => "SKIP_LATE",
            Action::Like => "LIKE",
            Action::Dislike => "DISLIKE",
            Action::NotInterested => "NOT_INTERESTED",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = SongSplayError;

    // Case-insensitive; dashes and spaces count as underscores
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");

        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == normalized)
            .ok_or_else(|| SongSplayError::InvalidAction(s.to_string()))
    }
}

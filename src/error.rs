/// Error types for songsplay
///
/// This module defines all possible errors that can occur in the application.
/// Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Main error type for songsplay operations
#[derive(Error, Debug)]
pub enum SongSplayError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O errors (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Song id is not in the catalog
    #[error("Song not found: {0}")]
    SongNotFound(String),

    /// Action name could not be parsed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Catalog could not be loaded
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Retraining trigger failed to start
    #[error("Retrain error: {0}")]
    Retrain(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for songsplay operations
pub type Result<T> = std::result::Result<T, SongSplayError>;

/// Convert SongSplayError to a user-friendly error message
impl SongSplayError {
    pub fn user_message(&self) -> String {
        match self {
            SongSplayError::Database(e) => {
                format!("Feedback database error. Please try again. Details: {}", e)
            }
            SongSplayError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            SongSplayError::Csv(e) => {
                format!("Could not read or write CSV data. Details: {}", e)
            }
            SongSplayError::Serialization(e) => {
                format!("Data format error: {}", e)
            }
            SongSplayError::SongNotFound(id) => {
                format!("Song '{}' is not in the catalog", id)
            }
            SongSplayError::InvalidAction(name) => {
                format!(
                    "Unknown action '{}'. Try play, complete, replay, skip, skip-late, like, dislike or not-interested",
                    name
                )
            }
            SongSplayError::Catalog(msg) => {
                format!("Catalog problem: {}", msg)
            }
            SongSplayError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
            SongSplayError::Retrain(msg) => {
                format!("Could not start retraining: {}", msg)
            }
            SongSplayError::Generic(msg) => msg.clone(),
        }
    }
}

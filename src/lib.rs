/// songsplay library
///
/// Ranks a song catalog for one listener. Scores blend content similarity,
/// accumulated feedback and popularity, and a splay tree keyed by those
/// live scores keeps recently touched songs near the top.

pub mod catalog;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod intelligence;

// Re-exports for convenience
pub use catalog::{Song, SongRegistry};
pub use config::Config;
pub use core::{Action, PlayerController};
pub use db::Database;
pub use error::{Result, SongSplayError};

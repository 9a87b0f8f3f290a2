/// Feedback storage
///
/// Every listener event goes to one or more sinks: the CSV interaction log
/// read by the trainer, and a SQLite store (sqlx, pooled) behind the
/// `history` and `status` commands.

pub mod connection;
pub mod csv_log;
pub mod models;
pub mod queries;
pub mod sink;

pub use connection::{Database, DatabaseStats};
pub use csv_log::CsvFeedbackLog;
pub use models::*;
pub use sink::{FeedbackSink, MemorySink};

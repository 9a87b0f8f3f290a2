/// Append-only CSV interaction log
///
/// This file is the input of the external weight trainer, so its layout is
/// fixed: one header line, then one row per event.

use crate::db::models::FeedbackEvent;
use crate::db::sink::FeedbackSink;
use crate::error::{Result, SongSplayError};
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Column names, in order
pub const HEADER: [&str; 6] = [
    "user_id",
    "track_id",
    "action",
    "ms_listened",
    "ms_track",
    "timestamp",
];

pub struct CsvFeedbackLog {
    path: PathBuf,
    writer: Arc<Mutex<csv::Writer<File>>>,
}

impl CsvFeedbackLog {
    /// Open for appending; the header is written only if the file is empty
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            writer.write_record(HEADER)?;
            writer.flush()?;
            debug!("Created feedback log at {}", path.display());
        }

        Ok(Self {
            path,
            writer: Arc::new(Mutex::new(writer)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FeedbackSink for CsvFeedbackLog {
    fn name(&self) -> &str {
        "csv"
    }

    // File writes run on the blocking pool, one row per lock
    async fn append(&self, event: &FeedbackEvent) -> Result<()> {
        let writer = Arc::clone(&self.writer);
        let event = event.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut writer = writer
                .lock()
                .map_err(|_| SongSplayError::Generic("feedback log lock poisoned".to_string()))?;
            writer.serialize(&event)?;
            writer.flush()?;
            Ok(())
        })
        .await
        .map_err(|e| SongSplayError::Generic(format!("feedback log write task failed: {}", e)))?
    }
}

/// Runtime configuration
///
/// Read from `$SONGSPLAY_CONFIG` or `~/.songsplay/config.json`. Every field
/// is optional in the file; anything left out takes its default.

use crate::error::{Result, SongSplayError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "SONGSPLAY_CONFIG";

/// Data directory name under the home directory
const DATA_DIR_NAME: &str = ".songsplay";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub weights_path: PathBuf,
    pub centroids_path: PathBuf,
    pub database_path: PathBuf,
    pub feedback_log_path: PathBuf,
    pub user_id: String,
    /// Retrain after this many events; 0 disables retraining
    pub retrain_every: u32,
    /// argv of the retrain job, e.g. ["python3", "scripts/train_weights.py"]
    pub retrain_command: Option<Vec<String>>,
    /// Only put the first N catalog songs into the ranking tree
    pub preload_count: Option<usize>,
    /// How far NOT_INTERESTED pulls the profile back toward neutral
    pub not_interested_reset: f64,
    /// Rebuild the tree after this many events; 0 never rebuilds on its own
    pub rebuild_every: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_data_dir(default_data_dir())
    }
}

impl Config {
    /// Defaults with every file placed under `data_dir`
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            catalog_path: data_dir.join("spotify_songs.csv"),
            weights_path: data_dir.join("data").join("feature_weights.json"),
            centroids_path: data_dir.join("data").join("kmeans_centroids.json"),
            database_path: data_dir.join("feedback.db"),
            feedback_log_path: data_dir.join("logs").join("interactions.csv"),
            data_dir,
            user_id: default_user(),
            retrain_every: 20,
            retrain_command: None,
            preload_count: None,
            not_interested_reset: 0.1,
            rebuild_every: 0,
        }
    }

    /// Load from a JSON file
    ///
    /// A missing file gives the defaults; a malformed one is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let mut config: Config = serde_json::from_value(value.clone())?;
        config.rebase_unset_paths(&value);
        config.validate()?;
        Ok(config)
    }

    // Paths the file leaves out follow its data_dir, not the home default
    fn rebase_unset_paths(&mut self, value: &serde_json::Value) {
        let derived = Self::with_data_dir(&self.data_dir);
        let is_set = |key: &str| value.get(key).is_some();

        if !is_set("catalog_path") {
            self.catalog_path = derived.catalog_path;
        }
        if !is_set("weights_path") {
            self.weights_path = derived.weights_path;
        }
        if !is_set("centroids_path") {
            self.centroids_path = derived.centroids_path;
        }
        if !is_set("database_path") {
            self.database_path = derived.database_path;
        }
        if !is_set("feedback_log_path") {
            self.feedback_log_path = derived.feedback_log_path;
        }
    }

    /// Load from `$SONGSPLAY_CONFIG`, else `<data dir>/config.json`
    pub fn load_default() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_data_dir().join("config.json"));
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.not_interested_reset.is_finite()
            || !(0.0..=1.0).contains(&self.not_interested_reset)
        {
            return Err(SongSplayError::Config(format!(
                "not_interested_reset must be within [0, 1], got {}",
                self.not_interested_reset
            )));
        }
        if let Some(argv) = &self.retrain_command {
            if argv.is_empty() {
                return Err(SongSplayError::Config(
                    "retrain_command must name a program".to_string(),
                ));
            }
        }
        if self.user_id.trim().is_empty() {
            return Err(SongSplayError::Config("user_id is empty".to_string()));
        }
        Ok(())
    }
}

/// `~/.songsplay`, or `./.songsplay` when there is no home directory
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

fn default_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| "local".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::with_data_dir("/data/songsplay");
        assert_eq!(config.retrain_every, 20);
        assert_eq!(config.not_interested_reset, 0.1);
        assert_eq!(config.retrain_command, None);
        assert_eq!(config.preload_count, None);
        assert_eq!(
            config.weights_path,
            PathBuf::from("/data/songsplay/data/feature_weights.json")
        );
        assert_eq!(
            config.feedback_log_path,
            PathBuf::from("/data/songsplay/logs/interactions.csv")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "user_id": "alice",
                "retrain_every": 5,
                "retrain_command": ["python3", "scripts/train_weights.py"],
                "preload_count": 1000
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.user_id, "alice");
        assert_eq!(config.retrain_every, 5);
        assert_eq!(config.preload_count, Some(1000));
        assert_eq!(config.retrain_command.as_ref().map(|c| c.len()), Some(2));
        assert_eq!(config.not_interested_reset, 0.1);
    }

    #[test]
    fn test_data_dir_moves_unset_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "data_dir": "/srv/music",
                "database_path": "/var/lib/songsplay/feedback.db"
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/music"));
        assert_eq!(
            config.catalog_path,
            PathBuf::from("/srv/music/spotify_songs.csv")
        );
        assert_eq!(
            config.weights_path,
            PathBuf::from("/srv/music/data/feature_weights.json")
        );
        assert_eq!(
            config.feedback_log_path,
            PathBuf::from("/srv/music/logs/interactions.csv")
        );
        // Explicit paths win over the data_dir
        assert_eq!(
            config.database_path,
            PathBuf::from("/var/lib/songsplay/feedback.db")
        );
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, SongSplayError::Serialization(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{"not_interested_reset": 2.5}"#).unwrap();
        assert!(matches!(
            Config::load(&path).unwrap_err(),
            SongSplayError::Config(_)
        ));

        std::fs::write(&path, r#"{"retrain_command": []}"#).unwrap();
        assert!(matches!(
            Config::load(&path).unwrap_err(),
            SongSplayError::Config(_)
        ));
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = Config::with_data_dir("/tmp/ss");
        let text = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}

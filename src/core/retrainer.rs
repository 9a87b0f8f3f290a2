/// Retraining triggers
///
/// After a batch of feedback events the player asks a `Retrainer` to
/// refresh the weight table. The new weights are picked up later by the
/// similarity engine's hot reload, so triggering never waits for training.

use crate::error::{Result, SongSplayError};
use std::process::{Child, Command};
use tracing::{debug, info};

pub trait Retrainer: Send {
    /// Start a retraining run; must not block on its completion
    fn trigger(&mut self) -> Result<()>;
}

/// Does nothing; used when no retrain command is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRetrainer;

impl Retrainer for NoopRetrainer {
    fn trigger(&mut self) -> Result<()> {
        debug!("Retrain requested but no retrainer is configured");
        Ok(())
    }
}

/// Spawns an external command, e.g. `python3 scripts/train_weights.py`
#[derive(Debug)]
pub struct CommandRetrainer {
    program: String,
    args: Vec<String>,
    running: Option<Child>,
}

impl CommandRetrainer {
    /// Build from an argv list; the first element is the program
    pub fn new(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| SongSplayError::Config("retrain_command is empty".to_string()))?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            running: None,
        })
    }

    /// Whether a previously spawned run is still going
    pub fn is_running(&mut self) -> bool {
        match self.running.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    debug!("Previous retrain finished with {}", status);
                    self.running = None;
                    false
                }
                Err(_) => {
                    self.running = None;
                    false
                }
            },
            None => false,
        }
    }
}

impl Retrainer for CommandRetrainer {
    // Skips the request if the last run has not exited yet
    fn trigger(&mut self) -> Result<()> {
        if self.is_running() {
            info!("Retrain still running, skipping this batch");
            return Ok(());
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .spawn()
            .map_err(|e| SongSplayError::Retrain(format!("{}: {}", self.program, e)))?;

        info!("Started retrain: {} (pid {})", self.program, child.id());
        self.running = Some(child);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_rejected() {
        let err = CommandRetrainer::new(&[]).unwrap_err();
        assert!(matches!(err, SongSplayError::Config(_)));
    }

    #[test]
    fn test_missing_program_is_retrain_error() {
        let mut retrainer =
            CommandRetrainer::new(&["songsplay-no-such-trainer".to_string()]).unwrap();
        let err = retrainer.trigger().unwrap_err();
        assert!(matches!(err, SongSplayError::Retrain(_)));
        assert!(!retrainer.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_and_reap() {
        let mut retrainer = CommandRetrainer::new(&["true".to_string()]).unwrap();
        retrainer.trigger().unwrap();

        // Wait for the child to exit, then it should be reaped
        for _ in 0..200 {
            if !retrainer.is_running() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(!retrainer.is_running());
    }

    #[test]
    fn test_noop() {
        assert!(NoopRetrainer.trigger().is_ok());
    }
}

/// Feature importance weights
///
/// The weight table is produced by an external trainer as a JSON object
/// of feature name to weight. It is reloaded when the file's modification
/// time changes; any failed load keeps the last good table.

use crate::catalog::Feature;
use crate::error::{Result, SongSplayError};
use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Built-in fallback table (sums to 1.0)
const DEFAULT_WEIGHTS: [(Feature, f64); 10] = [
    (Feature::Danceability, 0.20),
    (Feature::Energy, 0.20),
    (Feature::Valence, 0.15),
    (Feature::Instrumentalness, 0.10),
    (Feature::Liveness, 0.10),
    (Feature::Acousticness, 0.05),
    (Feature::Speechiness, 0.05),
    (Feature::Tempo, 0.05),
    (Feature::Loudness, 0.05),
    (Feature::DurationMs, 0.05),
];

/// Largest accepted weight; ten of these still sum to a finite value
pub const MAX_WEIGHT: f64 = 1e9;

/// Resolved weight table, always in vocabulary order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWeights {
    entries: Vec<(Feature, f64)>,
}

impl FeatureWeights {
    /// The built-in table used when no trained weights are available
    pub fn default_weights() -> Self {
        Self {
            entries: DEFAULT_WEIGHTS.to_vec(),
        }
    }

    /// Build from a name -> weight mapping
    ///
    /// Unknown names and negative, non-finite or oversized weights are
    /// skipped.
    pub fn from_map(map: &HashMap<String, f64>) -> Self {
        let mut entries = Vec::with_capacity(map.len());

        for (name, &weight) in map {
            let Some(feature) = Feature::from_name(name) else {
                debug!("Ignoring weight for unknown feature '{}'", name);
                continue;
            };
            if !weight.is_finite() || !(0.0..=MAX_WEIGHT).contains(&weight) {
                warn!("Ignoring invalid weight {} for '{}'", weight, name);
                continue;
            }
            entries.push((feature, weight));
        }

        // Fixed order keeps the similarity sum bit-for-bit reproducible
        entries.sort_by_key(|(feature, _)| *feature);
        Self { entries }
    }

    /// Parse the JSON object format written by the trainer
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(text)?;
        let map = raw
            .into_iter()
            .filter_map(|(name, value)| value.as_f64().map(|w| (name, w)))
            .collect();
        Ok(Self::from_map(&map))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.entries
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, w)| *w)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }
}

/// Loads the trained weight table and tracks when it last changed
#[derive(Debug)]
pub struct FeatureWeightLoader {
    weights: Option<FeatureWeights>,
    modified: Option<SystemTime>,
    fallback: FeatureWeights,
}

impl Default for FeatureWeightLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureWeightLoader {
    pub fn new() -> Self {
        Self {
            weights: None,
            modified: None,
            fallback: FeatureWeights::default_weights(),
        }
    }

    /// Load weights from `path`
    ///
    /// Returns `Ok(false)` when the file parsed but held no usable weights;
    /// the previous table stays active in that case and on any error.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<bool> {
        let path = path.as_ref();
        let modified = std::fs::metadata(path)?.modified()?;
        let text = std::fs::read_to_string(path)?;
        let weights = FeatureWeights::from_json(&text)?;

        if weights.is_empty() {
            warn!("No usable weights in {}; keeping previous table", path.display());
            return Ok(false);
        }

        info!("Loaded {} feature weights from {}", weights.len(), path.display());
        self.weights = Some(weights);
        self.modified = Some(modified);
        Ok(true)
    }

    /// Like `load`, but never fails; problems are logged
    pub fn try_load<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        match self.load(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Could not load weights from {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Reload when the file's modification time differs from the last load
    pub fn reload_if_changed<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(m) => m,
            Err(_) => return false,
        };

        if self.modified == Some(modified) {
            return false;
        }

        debug!("Weight file {} changed, reloading", path.display());
        self.try_load(path)
    }

    /// Trained weights, or the built-in table when none loaded
    pub fn active(&self) -> &FeatureWeights {
        self.weights.as_ref().unwrap_or(&self.fallback)
    }

    /// Replace the table directly (used by tests and embedders)
    pub fn set_weights(&mut self, weights: FeatureWeights) -> Result<()> {
        if weights.is_empty() {
            return Err(SongSplayError::Config("weight table is empty".to_string()));
        }
        self.weights = Some(weights);
        self.modified = None;
        Ok(())
    }

    pub fn is_using_default(&self) -> bool {
        self.weights.is_none()
    }
}

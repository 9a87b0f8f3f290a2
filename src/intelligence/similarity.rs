/// Content similarity between a song and the user's taste profile
///
/// `Similarity` is the seam the scorer and ranking tree depend on, so tests
/// can swap in a closure. `SimilarityEngine` is the real implementation:
/// a weighted per-feature closeness plus an optional cluster bonus.

use crate::catalog::{FeatureVector, Song};
use crate::intelligence::clusters::ClusterModel;
use crate::intelligence::weights::{FeatureWeightLoader, FeatureWeights};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location of the trained weight table
pub const DEFAULT_WEIGHTS_PATH: &str = "data/feature_weights.json";

/// Default location of the k-means centroids
pub const DEFAULT_CENTROIDS_PATH: &str = "data/kmeans_centroids.json";

/// Scores how close a song is to a profile average, in [0, 1]
pub trait Similarity {
    fn similarity(&self, song: &Song, profile: &FeatureVector) -> f64;
}

impl<F> Similarity for F
where
    F: Fn(&Song, &FeatureVector) -> f64,
{
    fn similarity(&self, song: &Song, profile: &FeatureVector) -> f64 {
        self(song, profile)
    }
}

/// Weighted closeness over the weight table's features
///
/// Each feature contributes `max(0, 1 - |song - profile|)` scaled by its
/// weight, and the sum is divided by the total weight used. With a zero
/// total the raw (zero) accumulator is returned instead of dividing.
pub fn weighted_similarity(weights: &FeatureWeights, song: &Song, profile: &FeatureVector) -> f64 {
    let mut acc = 0.0;
    let mut weight_sum = 0.0;

    for (feature, weight) in weights.iter() {
        let sim = (1.0 - (song.normalized(feature) - profile[feature]).abs()).max(0.0);
        acc += weight * sim;
        weight_sum += weight;
    }

    if weight_sum > 0.0 {
        acc / weight_sum
    } else {
        acc
    }
}

/// Similarity engine with hot-reloadable weights and optional clusters
#[derive(Debug)]
pub struct SimilarityEngine {
    weights: FeatureWeightLoader,
    clusters: ClusterModel,
    weights_path: PathBuf,
    centroids_path: PathBuf,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityEngine {
    /// Engine using the built-in weights and no clusters until `init`
    pub fn new() -> Self {
        Self {
            weights: FeatureWeightLoader::new(),
            clusters: ClusterModel::new(),
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            centroids_path: PathBuf::from(DEFAULT_CENTROIDS_PATH),
        }
    }

    pub fn with_paths<P: AsRef<Path>, Q: AsRef<Path>>(weights: P, centroids: Q) -> Self {
        let mut engine = Self::new();
        engine.set_paths(weights, centroids);
        engine
    }

    pub fn set_paths<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, weights: P, centroids: Q) {
        self.weights_path = weights.as_ref().to_path_buf();
        self.centroids_path = centroids.as_ref().to_path_buf();
    }

    /// Load weights and centroids; missing files just leave the defaults
    pub fn init(&mut self) {
        self.weights.try_load(&self.weights_path);
        self.clusters.try_load(&self.centroids_path);
    }

    /// Pick up a retrained weight file if it changed on disk
    pub fn hot_reload(&mut self) -> bool {
        let reloaded = self.weights.reload_if_changed(&self.weights_path);
        if reloaded {
            debug!("Similarity weights hot-reloaded");
        }
        reloaded
    }

    pub fn weights(&self) -> &FeatureWeights {
        self.weights.active()
    }

    pub fn weight_loader_mut(&mut self) -> &mut FeatureWeightLoader {
        &mut self.weights
    }

    pub fn set_clusters(&mut self, clusters: ClusterModel) {
        self.clusters = clusters;
    }

    pub fn clusters(&self) -> &ClusterModel {
        &self.clusters
    }

    pub fn weights_path(&self) -> &Path {
        &self.weights_path
    }

    pub fn centroids_path(&self) -> &Path {
        &self.centroids_path
    }
}

impl Similarity for SimilarityEngine {
    fn similarity(&self, song: &Song, profile: &FeatureVector) -> f64 {
        let base = weighted_similarity(self.weights.active(), song, profile);
        (base + self.clusters.affinity(profile)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Feature;
    use std::collections::HashMap;

    fn sample_song() -> Song {
        let mut raw = FeatureVector::zeros();
        raw[Feature::Danceability] = 0.8;
        raw[Feature::Energy] = 0.6;
        raw[Feature::Valence] = 0.3;
        raw[Feature::Tempo] = 120.0;
        raw[Feature::Loudness] = -6.0;
        raw[Feature::DurationMs] = 210_000.0;
        Song::new("s1", "Sample").with_features(raw)
    }

    #[test]
    fn test_identical_profile_is_one() {
        let engine = SimilarityEngine::new();
        let song = sample_song();
        let profile = song.normalized_features();

        assert_eq!(engine.similarity(&song, &profile), 1.0);
    }

    #[test]
    fn test_identical_profile_with_custom_weights_is_one() {
        let mut engine = SimilarityEngine::new();
        let mut map = HashMap::new();
        map.insert("energy".to_string(), 0.37);
        map.insert("tempo".to_string(), 0.11);
        map.insert("loudness".to_string(), 0.29);
        engine
            .weight_loader_mut()
            .set_weights(FeatureWeights::from_map(&map))
            .unwrap();

        let song = sample_song();
        assert_eq!(engine.similarity(&song, &song.normalized_features()), 1.0);
    }

    #[test]
    fn test_similarity_in_unit_range() {
        let engine = SimilarityEngine::new();
        let song = sample_song();

        for profile in [
            FeatureVector::zeros(),
            FeatureVector::splat(1.0),
            FeatureVector::splat(0.5),
        ] {
            let sim = engine.similarity(&song, &profile);
            assert!((0.0..=1.0).contains(&sim), "similarity {} out of range", sim);
        }
    }

    #[test]
    fn test_single_feature_difference() {
        let mut map = HashMap::new();
        map.insert("energy".to_string(), 2.0);
        let weights = FeatureWeights::from_map(&map);

        let song = sample_song();
        let mut profile = song.normalized_features();
        profile[Feature::Energy] = 0.2; // song has 0.6

        let sim = weighted_similarity(&weights, &song, &profile);
        assert!((sim - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weight_sum_returns_zero() {
        let mut map = HashMap::new();
        map.insert("energy".to_string(), 0.0);
        map.insert("valence".to_string(), 0.0);
        let weights = FeatureWeights::from_map(&map);

        let song = sample_song();
        assert_eq!(
            weighted_similarity(&weights, &song, &song.normalized_features()),
            0.0
        );
    }

    #[test]
    fn test_cluster_bonus_is_clamped() {
        let song = sample_song();
        let profile = song.normalized_features();

        let mut engine = SimilarityEngine::new();
        engine.set_clusters(ClusterModel::from_centroids(vec![profile]));

        // 1.0 + 0.1 bonus clamps back to 1.0
        assert_eq!(engine.similarity(&song, &profile), 1.0);

        // A looser match gains the bonus
        let far = FeatureVector::splat(0.5);
        engine.set_clusters(ClusterModel::from_centroids(vec![far]));
        let with_bonus = engine.similarity(&song, &far);
        engine.set_clusters(ClusterModel::new());
        let without = engine.similarity(&song, &far);
        assert!((with_bonus - without - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_closure_strategy() {
        let fixed = |_: &Song, _: &FeatureVector| 0.25;
        let song = sample_song();
        assert_eq!(fixed.similarity(&song, &FeatureVector::zeros()), 0.25);
    }

    #[test]
    fn test_init_with_missing_files_uses_defaults() {
        let mut engine = SimilarityEngine::with_paths("/no/weights.json", "/no/centroids.json");
        engine.init();
        assert_eq!(engine.weights(), &FeatureWeights::default_weights());
        assert!(engine.clusters().is_empty());
        assert!(!engine.hot_reload());
    }

    #[test]
    fn test_hot_reload_swaps_weights() {
        let dir = tempfile::tempdir().unwrap();
        let weights_path = dir.path().join("feature_weights.json");
        let mut engine =
            SimilarityEngine::with_paths(&weights_path, dir.path().join("centroids.json"));
        engine.init();
        assert_eq!(engine.weights(), &FeatureWeights::default_weights());

        std::fs::write(&weights_path, r#"{"valence": 1.0}"#).unwrap();
        assert!(engine.hot_reload());
        assert_eq!(engine.weights().len(), 1);
        assert_eq!(engine.weights().get(Feature::Valence), Some(1.0));
    }
}

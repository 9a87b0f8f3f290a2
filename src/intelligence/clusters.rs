/// Cluster centroid model
///
/// Optional k-means centroids in normalized feature space. When present
/// they add a small bonus (at most 0.1) to similarity for profiles that
/// sit close to a known cluster. Absence is never an error.

use crate::catalog::{FeatureVector, FEATURE_COUNT};
use crate::error::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Largest bonus a perfectly centred profile can earn
const MAX_AFFINITY: f64 = 0.1;

#[derive(Debug, Deserialize)]
struct CentroidFile {
    centroids: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct ClusterModel {
    centroids: Vec<FeatureVector>,
}

impl ClusterModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_centroids(centroids: Vec<FeatureVector>) -> Self {
        Self { centroids }
    }

    /// Parse `{"centroids": [[...10 values...], ...]}`
    ///
    /// Short rows are zero-padded and extra values ignored.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: CentroidFile = serde_json::from_str(text)?;
        let centroids = file
            .centroids
            .into_iter()
            .map(|row| {
                let mut v = FeatureVector::zeros();
                for (slot, value) in v.0.iter_mut().zip(row.into_iter().take(FEATURE_COUNT)) {
                    *slot = value;
                }
                v
            })
            .collect();

        Ok(Self { centroids })
    }

    /// Load centroids from disk, replacing the current set
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let text = std::fs::read_to_string(path.as_ref())?;
        *self = Self::from_json(&text)?;
        info!(
            "Loaded {} cluster centroids from {}",
            self.centroids.len(),
            path.as_ref().display()
        );
        Ok(self.centroids.len())
    }

    /// Load, keeping the current centroids on failure
    pub fn try_load<P: AsRef<Path>>(&mut self, path: P) -> bool {
        match self.load(path.as_ref()) {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    "No cluster centroids from {}: {}",
                    path.as_ref().display(),
                    e
                );
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    /// Bonus in [0, 0.1] from the distance to the nearest centroid
    pub fn affinity(&self, profile: &FeatureVector) -> f64 {
        let nearest = self
            .centroids
            .iter()
            .map(|c| c.distance(profile))
            .fold(f64::INFINITY, f64::min);

        if !nearest.is_finite() {
            return 0.0;
        }

        (MAX_AFFINITY - MAX_AFFINITY * nearest).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_centroids_no_bonus() {
        let model = ClusterModel::new();
        assert_eq!(model.affinity(&FeatureVector::splat(0.5)), 0.0);
    }

    #[test]
    fn test_affinity_on_centroid_is_max() {
        let model = ClusterModel::from_centroids(vec![FeatureVector::splat(0.5)]);
        assert!((model.affinity(&FeatureVector::splat(0.5)) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_affinity_uses_nearest_centroid() {
        let model = ClusterModel::from_centroids(vec![
            FeatureVector::splat(0.9),
            FeatureVector::zeros(),
        ]);

        let mut profile = FeatureVector::zeros();
        profile.0[0] = 0.5;
        // Nearest is the origin at distance 0.5 -> 0.1 - 0.05
        assert!((model.affinity(&profile) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_far_profile_gets_nothing() {
        let model = ClusterModel::from_centroids(vec![FeatureVector::zeros()]);
        assert_eq!(model.affinity(&FeatureVector::splat(1.0)), 0.0);
    }

    #[test]
    fn test_from_json_pads_short_rows() {
        let model = ClusterModel::from_json(r#"{"centroids": [[0.1, 0.2], [0,0,0,0,0,0,0,0,0,0,0.7]]}"#)
            .unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.centroids[0].0[1], 0.2);
        assert_eq!(model.centroids[0].0[9], 0.0);
    }

    #[test]
    fn test_try_load_missing_file_keeps_previous() {
        let mut model = ClusterModel::from_centroids(vec![FeatureVector::zeros()]);
        assert!(!model.try_load("/no/such/kmeans_centroids.json"));
        assert_eq!(model.len(), 1);

        let mut empty = ClusterModel::new();
        assert!(!empty.try_load("/no/such/kmeans_centroids.json"));
        assert_eq!(empty.affinity(&FeatureVector::zeros()), 0.0);
    }

    #[test]
    fn test_missing_key_is_error() {
        assert!(ClusterModel::from_json(r#"{"clusters": []}"#).is_err());
    }
}

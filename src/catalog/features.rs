/// Feature vocabulary and normalization
///
/// The 10 numeric audio features every component compares. The order of
/// `Feature::ALL` is shared by songs, the user profile, weight tables and
/// cluster centroids, so indices must never be permuted independently.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of features in the vocabulary
pub const FEATURE_COUNT: usize = 10;

/// Upper bound for tempo in BPM
const TEMPO_MAX: f64 = 250.0;

/// Lower bound for loudness in dB (upper bound is 0 dB)
const LOUDNESS_MIN: f64 = -60.0;

/// Upper bound for track length in milliseconds (10 minutes)
const DURATION_MAX_MS: f64 = 600_000.0;

/// A named audio feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Danceability,
    Energy,
    Valence,
    Instrumentalness,
    Liveness,
    Acousticness,
    Speechiness,
    Tempo,
    Loudness,
    DurationMs,
}

impl Feature {
    /// All features in vocabulary order
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Danceability,
        Feature::Energy,
        Feature::Valence,
        Feature::Instrumentalness,
        Feature::Liveness,
        Feature::Acousticness,
        Feature::Speechiness,
        Feature::Tempo,
        Feature::Loudness,
        Feature::DurationMs,
    ];

    /// Position of this feature in every feature vector
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column / weight-file name of the feature
    pub fn name(self) -> &'static str {
        match self {
            Feature::Danceability => "danceability",
            Feature::Energy => "energy",
            Feature::Valence => "valence",
            Feature::Instrumentalness => "instrumentalness",
            Feature::Liveness => "liveness",
            Feature::Acousticness => "acousticness",
            Feature::Speechiness => "speechiness",
            Feature::Tempo => "tempo",
            Feature::Loudness => "loudness",
            Feature::DurationMs => "duration_ms",
        }
    }

    /// Look up a feature by its column name
    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Map a raw value into [0, 1]
    ///
    /// Tempo clamps to [0, 250] BPM, loudness to [-60, 0] dB and duration
    /// to [0, 600000] ms before scaling. Everything else is already a
    /// 0..1 descriptor and is only clamped. NaN maps to 0.
    pub fn normalize(self, raw: f64) -> f64 {
        if raw.is_nan() {
            return 0.0;
        }

        match self {
            Feature::Tempo => raw.clamp(0.0, TEMPO_MAX) / TEMPO_MAX,
            Feature::Loudness => (raw.clamp(LOUDNESS_MIN, 0.0) - LOUDNESS_MIN) / -LOUDNESS_MIN,
            Feature::DurationMs => raw.clamp(0.0, DURATION_MAX_MS) / DURATION_MAX_MS,
            _ => raw.clamp(0.0, 1.0),
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fixed-size vector of feature values in vocabulary order
///
/// Used for raw song features, normalized features and the profile average.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    /// All-zero vector
    pub fn zeros() -> Self {
        Self([0.0; FEATURE_COUNT])
    }

    /// Vector with every dimension set to `value`
    pub fn splat(value: f64) -> Self {
        Self([value; FEATURE_COUNT])
    }

    /// Normalize every dimension with its feature's rule
    pub fn normalized(&self) -> FeatureVector {
        let mut out = FeatureVector::zeros();
        for feature in Feature::ALL {
            out[feature] = feature.normalize(self[feature]);
        }
        out
    }

    /// Euclidean distance to another vector
    pub fn distance(&self, other: &FeatureVector) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Index<Feature> for FeatureVector {
    type Output = f64;

    fn index(&self, feature: Feature) -> &f64 {
        &self.0[feature.index()]
    }
}

impl IndexMut<Feature> for FeatureVector {
    fn index_mut(&mut self, feature: Feature) -> &mut f64 {
        &mut self.0[feature.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_order() {
        let names: Vec<&str> = Feature::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "danceability",
                "energy",
                "valence",
                "instrumentalness",
                "liveness",
                "acousticness",
                "speechiness",
                "tempo",
                "loudness",
                "duration_ms"
            ]
        );

        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Feature::from_name("tempo"), Some(Feature::Tempo));
        assert_eq!(Feature::from_name("duration_ms"), Some(Feature::DurationMs));
        assert_eq!(Feature::from_name("key"), None);
        assert_eq!(Feature::from_name("Tempo"), None);
    }

    #[test]
    fn test_normalize_tempo() {
        assert_eq!(Feature::Tempo.normalize(125.0), 0.5);
        assert_eq!(Feature::Tempo.normalize(-10.0), 0.0);
        assert_eq!(Feature::Tempo.normalize(400.0), 1.0);
    }

    #[test]
    fn test_normalize_loudness() {
        assert_eq!(Feature::Loudness.normalize(-60.0), 0.0);
        assert_eq!(Feature::Loudness.normalize(0.0), 1.0);
        assert_eq!(Feature::Loudness.normalize(-30.0), 0.5);
        assert_eq!(Feature::Loudness.normalize(-90.0), 0.0);
        assert_eq!(Feature::Loudness.normalize(3.0), 1.0);
    }

    #[test]
    fn test_normalize_duration() {
        assert_eq!(Feature::DurationMs.normalize(300_000.0), 0.5);
        assert_eq!(Feature::DurationMs.normalize(900_000.0), 1.0);
        assert_eq!(Feature::DurationMs.normalize(-1.0), 0.0);
    }

    #[test]
    fn test_normalize_unit_features_clamp() {
        assert_eq!(Feature::Energy.normalize(0.42), 0.42);
        assert_eq!(Feature::Valence.normalize(1.7), 1.0);
        assert_eq!(Feature::Speechiness.normalize(-0.2), 0.0);
        assert_eq!(Feature::Danceability.normalize(f64::NAN), 0.0);
    }

    #[test]
    fn test_vector_normalized_and_distance() {
        let mut raw = FeatureVector::zeros();
        raw[Feature::Tempo] = 250.0;
        raw[Feature::Loudness] = -60.0;
        raw[Feature::Energy] = 0.5;

        let norm = raw.normalized();
        assert_eq!(norm[Feature::Tempo], 1.0);
        assert_eq!(norm[Feature::Loudness], 0.0);
        assert_eq!(norm[Feature::Energy], 0.5);

        let a = FeatureVector::zeros();
        let mut b = FeatureVector::zeros();
        b[Feature::Energy] = 3.0;
        b[Feature::Valence] = 4.0;
        assert_eq!(a.distance(&b), 5.0);
    }
}

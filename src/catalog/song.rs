/// Song records
///
/// A song is an immutable catalog entry plus one mutable feedback
/// accumulator that user actions push up or down.

use crate::catalog::features::{Feature, FeatureVector};
use serde::{Deserialize, Serialize};

/// A catalog song
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Song {
    pub track_id: String,
    pub track_name: String,
    pub track_artist: String,
    pub track_popularity: i32, // 0..100
    pub track_album_id: String,
    pub track_album_name: String,
    pub track_album_release_date: String,
    pub playlist_name: String,
    pub playlist_id: String,
    pub playlist_genre: String,
    pub playlist_subgenre: String,
    pub key: i32,
    pub mode: i32,

    /// Raw (unnormalized) audio features in vocabulary order
    pub features: FeatureVector,

    // Only mutated through apply_feedback / reset_feedback
    #[serde(skip)]
    feedback: i32,
}

impl Song {
    /// Create a song with just an id and a name; everything else zero
    pub fn new(track_id: impl Into<String>, track_name: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            track_name: track_name.into(),
            ..Default::default()
        }
    }

    /// Builder-style popularity setter
    pub fn with_popularity(mut self, popularity: i32) -> Self {
        self.track_popularity = popularity;
        self
    }

    /// Builder-style raw feature setter
    pub fn with_features(mut self, features: FeatureVector) -> Self {
        self.features = features;
        self
    }

    /// Raw value of one feature
    pub fn raw(&self, feature: Feature) -> f64 {
        self.features[feature]
    }

    /// Normalized value of one feature
    pub fn normalized(&self, feature: Feature) -> f64 {
        feature.normalize(self.features[feature])
    }

    /// All features normalized to [0, 1]
    pub fn normalized_features(&self) -> FeatureVector {
        self.features.normalized()
    }

    /// Track length in milliseconds
    pub fn duration_ms(&self) -> i64 {
        self.features[Feature::DurationMs].max(0.0) as i64
    }

    /// Current feedback accumulator
    pub fn feedback(&self) -> i32 {
        self.feedback
    }

    /// Add a signed delta to the feedback accumulator
    pub fn apply_feedback(&mut self, delta: i32) {
        self.feedback = self.feedback.saturating_add(delta);
    }

    /// Forget all feedback for this song
    pub fn reset_feedback(&mut self) {
        self.feedback = 0;
    }
}

impl std::fmt::Display for Song {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.track_artist.is_empty() {
            write!(f, "{}", self.track_name)
        } else {
            write!(f, "{} - {}", self.track_name, self.track_artist)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_accumulates() {
        let mut song = Song::new("t1", "Blinding Lights");
        assert_eq!(song.feedback(), 0);

        song.apply_feedback(3);
        song.apply_feedback(3);
        assert_eq!(song.feedback(), 6);

        song.apply_feedback(-4);
        assert_eq!(song.feedback(), 2);

        song.reset_feedback();
        assert_eq!(song.feedback(), 0);
    }

    #[test]
    fn test_feedback_monotonic_same_sign() {
        let mut song = Song::new("t1", "Levitating");
        let mut last = song.feedback();
        for _ in 0..20 {
            song.apply_feedback(-3);
            assert!(song.feedback() < last);
            last = song.feedback();
        }
    }

    #[test]
    fn test_feedback_saturates() {
        let mut song = Song::new("t1", "Loop");
        song.apply_feedback(i32::MAX);
        song.apply_feedback(3);
        assert_eq!(song.feedback(), i32::MAX);
    }

    #[test]
    fn test_normalized_features() {
        let mut raw = FeatureVector::zeros();
        raw[Feature::Tempo] = 125.0;
        raw[Feature::DurationMs] = 180_000.0;
        let song = Song::new("t1", "Song").with_features(raw);

        assert_eq!(song.normalized(Feature::Tempo), 0.5);
        assert_eq!(song.normalized_features()[Feature::DurationMs], 0.3);
        assert_eq!(song.duration_ms(), 180_000);
    }

    #[test]
    fn test_display() {
        let mut song = Song::new("t1", "Halo");
        assert_eq!(song.to_string(), "Halo");
        song.track_artist = "Beyonce".to_string();
        assert_eq!(song.to_string(), "Halo - Beyonce");
    }
}

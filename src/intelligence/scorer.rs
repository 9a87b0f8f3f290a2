/// Ranking key computation
///
/// Blends content similarity, squashed feedback and popularity into one
/// fixed-point integer that orders the ranking tree.

use crate::catalog::{FeatureVector, Song};
use crate::intelligence::blend::BlendWeights;
use crate::intelligence::similarity::Similarity;

/// Steepness of the logistic squash applied to the feedback accumulator
const FEEDBACK_STEEPNESS: f64 = 0.35;

/// Fixed-point scale of the ranking key (about 6 significant digits)
pub const KEY_SCALE: f64 = 1_000_000.0;

/// Ranking key of a song
pub type ScoreKey = i64;

/// Scorer for ranking keys
pub struct Scorer;

impl Scorer {
    /// Squash the unbounded feedback accumulator into (0, 1)
    ///
    /// 0 maps to 0.5; large positive values approach 1.
    pub fn feedback_signal(feedback: i32) -> f64 {
        1.0 / (1.0 + (-FEEDBACK_STEEPNESS * feedback as f64).exp())
    }

    /// Popularity 0..100 as a clamped fraction
    pub fn popularity_signal(popularity: i32) -> f64 {
        (popularity as f64 / 100.0).clamp(0.0, 1.0)
    }

    /// Blended score in [0, 1] before fixed-point scaling
    pub fn combined_score(
        song: &Song,
        profile: &FeatureVector,
        interactions: u64,
        similarity: &dyn Similarity,
    ) -> f64 {
        let base = similarity.similarity(song, profile);
        let feedback = Self::feedback_signal(song.feedback());
        let popularity = Self::popularity_signal(song.track_popularity);

        BlendWeights::for_interactions(interactions).combine(base, feedback, popularity)
    }

    /// Ranking key: the combined score scaled by 1e6 and rounded
    ///
    /// Pure in its inputs; the same song state, profile and interaction
    /// count always give the same key.
    pub fn score(
        song: &Song,
        profile: &FeatureVector,
        interactions: u64,
        similarity: &dyn Similarity,
    ) -> ScoreKey {
        Self::to_key(Self::combined_score(song, profile, interactions, similarity))
    }

    /// Convert a [0, 1] score into a ranking key
    pub fn to_key(score: f64) -> ScoreKey {
        (score * KEY_SCALE).round() as ScoreKey
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Feature;
    use crate::intelligence::similarity::SimilarityEngine;

    fn content() -> FeatureVector {
        let mut raw = FeatureVector::zeros();
        raw[Feature::Danceability] = 0.65;
        raw[Feature::Energy] = 0.8;
        raw[Feature::Valence] = 0.45;
        raw[Feature::Tempo] = 118.0;
        raw[Feature::Loudness] = -5.5;
        raw[Feature::DurationMs] = 205_000.0;
        raw
    }

    fn song(id: &str, popularity: i32) -> Song {
        Song::new(id, id)
            .with_popularity(popularity)
            .with_features(content())
    }

    #[test]
    fn test_feedback_signal() {
        assert_eq!(Scorer::feedback_signal(0), 0.5);
        assert!(Scorer::feedback_signal(3) > 0.5);
        assert!(Scorer::feedback_signal(-3) < 0.5);
        assert!(Scorer::feedback_signal(1000) <= 1.0);
        assert!(Scorer::feedback_signal(-1000) >= 0.0);
        assert!(Scorer::feedback_signal(10) > Scorer::feedback_signal(9));
    }

    #[test]
    fn test_popularity_signal_clamps() {
        assert_eq!(Scorer::popularity_signal(50), 0.5);
        assert_eq!(Scorer::popularity_signal(150), 1.0);
        assert_eq!(Scorer::popularity_signal(-5), 0.0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let engine = SimilarityEngine::new();
        let s = song("a", 40);
        let profile = FeatureVector::splat(0.4);

        let first = Scorer::score(&s, &profile, 17, &engine);
        for _ in 0..10 {
            assert_eq!(Scorer::score(&s, &profile, 17, &engine), first);
        }
    }

    #[test]
    fn test_cold_start_key_value() {
        // similarity 1, feedback 0.5, popularity 0.5 at n=0:
        // 0.70 + 0.15 * 0.5 + 0.15 * 0.5 = 0.85
        let s = song("a", 50);
        let profile = s.normalized_features();
        let key = Scorer::score(&s, &profile, 0, &SimilarityEngine::new());
        assert_eq!(key, 850_000);
    }

    #[test]
    fn test_order_follows_popularity_when_otherwise_tied() {
        let engine = SimilarityEngine::new();
        let low = song("low", 10);
        let mid = song("mid", 50);
        let high = song("high", 90);
        let profile = low.normalized_features();

        let k_low = Scorer::score(&low, &profile, 0, &engine);
        let k_mid = Scorer::score(&mid, &profile, 0, &engine);
        let k_high = Scorer::score(&high, &profile, 0, &engine);

        assert!(k_low < k_mid);
        assert!(k_mid < k_high);
    }

    #[test]
    fn test_not_interested_reset_matches_fresh_song() {
        let engine = SimilarityEngine::new();
        let profile = FeatureVector::splat(0.3);

        let mut touched = song("t", 70);
        touched.apply_feedback(9);
        touched.apply_feedback(-4);
        touched.reset_feedback();

        let fresh = song("f", 70);
        assert_eq!(
            Scorer::score(&touched, &profile, 12, &engine),
            Scorer::score(&fresh, &profile, 12, &engine)
        );
    }

    #[test]
    fn test_injected_similarity() {
        let zero = |_: &Song, _: &FeatureVector| 0.0;
        let one = |_: &Song, _: &FeatureVector| 1.0;
        let s = song("a", 0);
        let profile = FeatureVector::zeros();

        // Only the similarity term differs: 0.70 at n=0
        let diff = Scorer::score(&s, &profile, 0, &one) - Scorer::score(&s, &profile, 0, &zero);
        assert_eq!(diff, 700_000);
    }

    #[test]
    fn test_to_key_rounds() {
        assert_eq!(Scorer::to_key(0.1234564), 123_456);
        assert_eq!(Scorer::to_key(0.1234566), 123_457);
        assert_eq!(Scorer::to_key(1.0), 1_000_000);
    }
}

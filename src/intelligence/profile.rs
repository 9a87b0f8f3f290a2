// User taste profile
//
// An exponentially weighted moving average of the normalized features of
// songs the user reacted well to, plus a count of every interaction.

use crate::catalog::{FeatureVector, Song};

// How far each positive update pulls the average toward the song
const SMOOTHING: f64 = 0.10;

// Where soft_reset pulls every dimension
const NEUTRAL: f64 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    average: FeatureVector,
    seeded: bool,
    total_interactions: u64,
}

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// A profile that already has an average, e.g. restored or for tests
    pub fn with_average(average: FeatureVector, total_interactions: u64) -> Self {
        Self {
            average,
            seeded: true,
            total_interactions,
        }
    }

    // Feed one feedback event into the profile.
    //
    // The first non-negative update copies the song's features outright.
    // After that only positive deltas move the average. Negative feedback
    // never pulls the profile away; it lives in the song's accumulator.
    // Every call counts as an interaction.
    pub fn update(&mut self, song: &Song, delta: i32) {
        if delta >= 0 {
            let features = song.normalized_features();
            if !self.seeded {
                self.average = features;
                self.seeded = true;
            } else if delta > 0 {
                for (avg, x) in self.average.0.iter_mut().zip(features.0.iter()) {
                    *avg = (1.0 - SMOOTHING) * *avg + SMOOTHING * x;
                }
            }
        }

        self.record_interaction();
    }

    /// Count an interaction without touching the average
    pub fn record_interaction(&mut self) {
        self.total_interactions = self.total_interactions.saturating_add(1);
    }

    /// Pull every dimension toward 0.5 by `factor` (clamped to [0, 1])
    ///
    /// Used after a strong negative signal. Leaves the interaction count alone.
    pub fn soft_reset(&mut self, factor: f64) {
        let factor = if factor.is_nan() { 0.0 } else { factor.clamp(0.0, 1.0) };
        for avg in self.average.0.iter_mut() {
            *avg = (1.0 - factor) * *avg + factor * NEUTRAL;
        }
    }

    pub fn average(&self) -> &FeatureVector {
        &self.average
    }

    pub fn total_interactions(&self) -> u64 {
        self.total_interactions
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }
}

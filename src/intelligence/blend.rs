/// Blend schedule
///
/// Decides how much the final score trusts content similarity (alpha),
/// accumulated feedback (beta) and popularity (gamma). Early on similarity
/// and popularity dominate; as interactions pile up, feedback takes over.

/// Interaction count at which the schedule stops moving
pub const SCHEDULE_HORIZON: u64 = 200;

/// Popularity never drops below this share before renormalizing
pub const MIN_POPULARITY_WEIGHT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub similarity: f64,
    pub feedback: f64,
    pub popularity: f64,
}

impl BlendWeights {
    /// Weights for a given number of interactions
    ///
    /// `t = min(n, 200) / 200`, feedback `0.15 + 0.50t`, similarity
    /// `0.70 - 0.40t`, popularity takes the rest but at least 0.05, then all
    /// three are divided by their sum.
    pub fn for_interactions(interactions: u64) -> Self {
        let t = interactions.min(SCHEDULE_HORIZON) as f64 / SCHEDULE_HORIZON as f64;

        let feedback = 0.15 + 0.50 * t;
        let similarity = 0.70 - 0.40 * t;
        let popularity = (1.0 - (similarity + feedback)).max(MIN_POPULARITY_WEIGHT);

        let sum = similarity + feedback + popularity;
        Self {
            similarity: similarity / sum,
            feedback: feedback / sum,
            popularity: popularity / sum,
        }
    }

    pub fn total(&self) -> f64 {
        self.similarity + self.feedback + self.popularity
    }

    /// Combine the three signals, each expected in [0, 1]
    pub fn combine(&self, similarity: f64, feedback: f64, popularity: f64) -> f64 {
        self.similarity * similarity + self.feedback * feedback + self.popularity * popularity
    }
}

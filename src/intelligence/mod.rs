/// Intelligence module
///
/// Everything that turns a song and the listener's history into a number:
/// feature weights, cluster affinity, similarity, the blend schedule, the
/// user profile and the final ranking key.

pub mod blend;
pub mod clusters;
pub mod profile;
pub mod scorer;
pub mod similarity;
pub mod weights;

pub use blend::BlendWeights;
pub use clusters::ClusterModel;
pub use profile::UserProfile;
pub use scorer::{ScoreKey, Scorer};
pub use similarity::{Similarity, SimilarityEngine};
pub use weights::{FeatureWeightLoader, FeatureWeights};

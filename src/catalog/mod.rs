/// Catalog module
///
/// Feature vocabulary, song records and the registry that owns them.

pub mod features;
pub mod registry;
pub mod song;

pub use features::{Feature, FeatureVector, FEATURE_COUNT};
pub use registry::{SongIndex, SongRegistry};
pub use song::Song;

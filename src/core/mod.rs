/// Core functionality modules
///
/// Listener actions, the self-adjusting ranking tree, the per-session
/// player controller, catalog search and retraining triggers.

pub mod action;
pub mod player;
pub mod ranking_tree;
pub mod retrainer;
pub mod searcher;

pub use action::Action;
pub use player::{ActionOutcome, PlayerController};
pub use ranking_tree::{NodeId, RankedSong, ScoreContext, SongSplay};
pub use retrainer::{CommandRetrainer, NoopRetrainer, Retrainer};
pub use searcher::{SearchHit, Searcher};

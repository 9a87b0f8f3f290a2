// Player controller - one listener's session
//
// Owns the catalog, the listener's profile, the ranking tree and the
// similarity engine. Each action runs the ranking update synchronously,
// then fans the event out to the feedback sinks, counts toward the next
// retrain and picks up any new weight file.

use crate::catalog::{SongIndex, SongRegistry};
use crate::config::Config;
use crate::core::action::Action;
use crate::core::ranking_tree::{RankedSong, ScoreContext, SongSplay};
use crate::core::retrainer::{CommandRetrainer, NoopRetrainer, Retrainer};
use crate::db::{FeedbackEvent, FeedbackSink};
use crate::error::Result;
use crate::intelligence::{ScoreKey, SimilarityEngine, UserProfile};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of events between retrains
pub const DEFAULT_RETRAIN_EVERY: u32 = 20;

/// Default pull toward neutral on NOT_INTERESTED
pub const DEFAULT_NOT_INTERESTED_RESET: f64 = 0.1;

/// What happened to the ranking after one action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub song: SongIndex,
    pub key: ScoreKey,
    pub event: FeedbackEvent,
    pub retrained: bool,
    pub reloaded: bool,
}

pub struct PlayerController {
    registry: SongRegistry,
    profile: UserProfile,
    tree: SongSplay,
    engine: SimilarityEngine,
    sinks: Vec<Arc<dyn FeedbackSink>>,
    retrainer: Box<dyn Retrainer>,
    user_id: String,
    retrain_every: u32,
    since_retrain: u32,
    rebuild_every: u32,
    since_rebuild: u32,
    not_interested_reset: f64,
}

impl PlayerController {
    /// Controller with no sinks and no retrainer
    pub fn new(registry: SongRegistry, engine: SimilarityEngine) -> Self {
        Self {
            registry,
            profile: UserProfile::new(),
            tree: SongSplay::new(),
            engine,
            sinks: Vec::new(),
            retrainer: Box::new(NoopRetrainer),
            user_id: "local".to_string(),
            retrain_every: DEFAULT_RETRAIN_EVERY,
            since_retrain: 0,
            rebuild_every: 0,
            since_rebuild: 0,
            not_interested_reset: DEFAULT_NOT_INTERESTED_RESET,
        }
    }

    /// Wire up an engine and retrainer from the config
    ///
    /// Loads the weight and centroid files (missing ones fall back to the
    /// defaults). Sinks are added separately since opening them is async.
    pub fn from_config(config: &Config, registry: SongRegistry) -> Result<Self> {
        let mut engine = SimilarityEngine::with_paths(&config.weights_path, &config.centroids_path);
        engine.init();

        let retrainer: Box<dyn Retrainer> = match &config.retrain_command {
            Some(argv) => Box::new(CommandRetrainer::new(argv)?),
            None => Box::new(NoopRetrainer),
        };

        let mut controller = Self::new(registry, engine)
            .with_user(config.user_id.clone())
            .with_retrainer(retrainer);
        controller.retrain_every = config.retrain_every;
        controller.rebuild_every = config.rebuild_every;
        controller.not_interested_reset = config.not_interested_reset;
        Ok(controller)
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_retrainer(mut self, retrainer: Box<dyn Retrainer>) -> Self {
        self.retrainer = retrainer;
        self
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Retrain after every `n` events (0 disables)
    pub fn set_retrain_every(&mut self, n: u32) {
        self.retrain_every = n;
        self.since_retrain = 0;
    }

    /// Rebuild the tree after every `n` events (0 disables)
    pub fn set_rebuild_every(&mut self, n: u32) {
        self.rebuild_every = n;
        self.since_rebuild = 0;
    }

    pub fn set_not_interested_reset(&mut self, factor: f64) {
        self.not_interested_reset = factor;
    }

    pub fn add_sink(&mut self, sink: Arc<dyn FeedbackSink>) {
        self.sinks.push(sink);
    }

    /// Put one catalog song into the ranking tree
    ///
    /// Unknown ids and songs already in the tree are ignored.
    pub fn ingest_song(&mut self, track_id: &str) -> bool {
        match self.registry.index_of(track_id) {
            Some(idx) => self.ingest_index(idx),
            None => {
                debug!("Ignoring ingest of unknown track {}", track_id);
                false
            }
        }
    }

    /// Ingest the first `limit` catalog songs in file order
    pub fn ingest_first(&mut self, limit: usize) -> usize {
        let indices: Vec<SongIndex> = self.registry.indices().take(limit).collect();
        indices
            .into_iter()
            .filter(|&idx| self.ingest_index(idx))
            .count()
    }

    pub fn ingest_all(&mut self) -> usize {
        self.ingest_first(self.registry.len())
    }

    fn ingest_index(&mut self, idx: SongIndex) -> bool {
        let ctx = ScoreContext::new(&self.registry, &self.profile, &self.engine);
        self.tree.insert(idx, &ctx)
    }

    // Handle one listener action.
    //
    // Unknown ids are a silent no-op (None). Otherwise the ranking state
    // is updated first; sink failures and retrain spawn failures are
    // logged and never undo or block that update.
    pub async fn on_action(
        &mut self,
        track_id: &str,
        action: Action,
        ms_listened: i64,
    ) -> Option<ActionOutcome> {
        let (idx, key) = self.apply(track_id, action)?;

        let song = self.registry.song(idx);
        let event = FeedbackEvent::now(
            self.user_id.as_str(),
            song.track_id.as_str(),
            action,
            ms_listened,
            song.duration_ms(),
        );
        self.dispatch(&event).await;

        let retrained = self.count_toward_retrain();

        if self.rebuild_every > 0 {
            self.since_rebuild += 1;
            if self.since_rebuild >= self.rebuild_every {
                self.since_rebuild = 0;
                self.rebuild();
            }
        }

        let reloaded = self.engine.hot_reload();

        Some(ActionOutcome {
            song: idx,
            key,
            event,
            retrained,
            reloaded,
        })
    }

    /// Replay a stored event: ranking update only, nothing logged
    pub fn replay(&mut self, track_id: &str, action: Action) -> Option<ScoreKey> {
        self.apply(track_id, action).map(|(_, key)| key)
    }

    fn apply(&mut self, track_id: &str, action: Action) -> Option<(SongIndex, ScoreKey)> {
        let Some(idx) = self.registry.index_of(track_id) else {
            debug!("Ignoring {} on unknown track {}", action, track_id);
            return None;
        };

        let key = if action.is_reset() {
            self.tree.reset(
                idx,
                self.not_interested_reset,
                &mut self.registry,
                &mut self.profile,
                &self.engine,
            )
        } else {
            self.tree.promote(
                idx,
                action.delta(),
                &mut self.registry,
                &mut self.profile,
                &self.engine,
            )
        };
        Some((idx, key))
    }

    async fn dispatch(&self, event: &FeedbackEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.append(event).await {
                warn!("Feedback sink '{}' failed: {}", sink.name(), e);
            }
        }
    }

    fn count_toward_retrain(&mut self) -> bool {
        if self.retrain_every == 0 {
            return false;
        }

        self.since_retrain += 1;
        if self.since_retrain < self.retrain_every {
            return false;
        }

        self.since_retrain = 0;
        match self.retrainer.trigger() {
            Ok(()) => {
                info!("Retrain triggered after {} events", self.retrain_every);
                true
            }
            Err(e) => {
                warn!("Retrain failed to start: {}", e);
                false
            }
        }
    }

    /// Best `limit` songs, best first
    pub fn ranking(&self, limit: usize) -> Vec<RankedSong> {
        self.tree.top(limit, &self.context())
    }

    /// Rebalance the tree from a sort of the current keys
    pub fn rebuild(&mut self) {
        let ctx = ScoreContext::new(&self.registry, &self.profile, &self.engine);
        self.tree.rebuild(&ctx);
        debug!("Ranking tree rebuilt ({} songs)", self.tree.len());
    }

    /// Whether the tree's order still matches the current keys
    pub fn is_sorted(&self) -> bool {
        self.tree.is_sorted(&self.context())
    }

    pub fn context(&self) -> ScoreContext<'_> {
        ScoreContext::new(&self.registry, &self.profile, &self.engine)
    }

    pub fn registry(&self) -> &SongRegistry {
        &self.registry
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn tree(&self) -> &SongSplay {
        &self.tree
    }

    pub fn engine(&self) -> &SimilarityEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SimilarityEngine {
        &mut self.engine
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

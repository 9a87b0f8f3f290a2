// Ranking tree - a splay tree keyed by live scores
//
// Nodes live in an arena and point at songs by handle. No key is stored on
// a node: every comparison asks the scorer for the song's current key, so
// the tree always sees the latest feedback and profile.
//
// Known limitation: a node's position was decided under the keys in force
// when it was last rotated. Once the profile drifts (or a song's own
// feedback moves its key), the in-order walk is only approximately sorted.
// That is accepted; `rebuild` restores exact order on demand.

use crate::catalog::{SongIndex, SongRegistry};
use crate::intelligence::scorer::{ScoreKey, Scorer};
use crate::intelligence::{Similarity, UserProfile};
use std::collections::HashSet;

/// Everything needed to compute a song's current ranking key
#[derive(Clone, Copy)]
pub struct ScoreContext<'a> {
    pub registry: &'a SongRegistry,
    pub profile: &'a UserProfile,
    pub similarity: &'a dyn Similarity,
}

impl<'a> ScoreContext<'a> {
    pub fn new(
        registry: &'a SongRegistry,
        profile: &'a UserProfile,
        similarity: &'a dyn Similarity,
    ) -> Self {
        Self {
            registry,
            profile,
            similarity,
        }
    }

    /// Current key of a song
    pub fn key(&self, song: SongIndex) -> ScoreKey {
        Scorer::score(
            self.registry.song(song),
            self.profile.average(),
            self.profile.total_interactions(),
            self.similarity,
        )
    }
}

/// A song and the key it had when visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedSong {
    pub song: SongIndex,
    pub key: ScoreKey,
}

/// Handle to a node in the tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    song: SongIndex,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

#[derive(Debug, Default)]
pub struct SongSplay {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    members: HashSet<SongIndex>,
}

impl SongSplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, song: SongIndex) -> bool {
        self.members.contains(&song)
    }

    /// Song at the root, i.e. the one most recently splayed to the top
    pub fn root_song(&self) -> Option<SongIndex> {
        self.root.map(|id| self.node(id).song)
    }

    // Insert a song, then splay by its key.
    //
    // Walks down comparing against each node's freshly computed key: smaller
    // goes left, anything else goes right, so equal keys keep insertion
    // order. The splay stops at the first node carrying the key, so with a
    // tie the older equal song ends up at the root, not the new one.
    // Returns false if the song was already in the tree.
    pub fn insert(&mut self, song: SongIndex, ctx: &ScoreContext<'_>) -> bool {
        if !self.members.insert(song) {
            return false;
        }

        let key = ctx.key(song);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            song,
            left: None,
            right: None,
        });

        let Some(mut cur) = self.root else {
            self.root = Some(id);
            return true;
        };

        loop {
            let go_left = key < self.key_of(cur, ctx);
            let next = if go_left {
                &mut self.node_mut(cur).left
            } else {
                &mut self.node_mut(cur).right
            };

            match *next {
                Some(child) => cur = child,
                None => {
                    *next = Some(id);
                    break;
                }
            }
        }

        self.splay(key, ctx);
        true
    }

    // Apply a feedback delta to a song and splay at its new key.
    //
    // Non-negative deltas also feed the user profile (which may shift every
    // key in the tree); negative ones are only counted as interactions.
    pub fn promote(
        &mut self,
        song: SongIndex,
        delta: i32,
        registry: &mut SongRegistry,
        profile: &mut UserProfile,
        similarity: &dyn Similarity,
    ) -> ScoreKey {
        registry.song_mut(song).apply_feedback(delta);
        if delta >= 0 {
            profile.update(registry.song(song), delta);
        } else {
            profile.record_interaction();
        }

        let ctx = ScoreContext::new(registry, profile, similarity);
        self.splay_song(song, &ctx)
    }

    // "Not interested": zero the song's accumulator, pull the profile back
    // toward neutral by `profile_reset`, count the interaction and splay.
    pub fn reset(
        &mut self,
        song: SongIndex,
        profile_reset: f64,
        registry: &mut SongRegistry,
        profile: &mut UserProfile,
        similarity: &dyn Similarity,
    ) -> ScoreKey {
        registry.song_mut(song).reset_feedback();
        profile.soft_reset(profile_reset);
        profile.record_interaction();

        let ctx = ScoreContext::new(registry, profile, similarity);
        self.splay_song(song, &ctx)
    }

    /// Splay at a song's current key; returns that key
    pub fn splay_song(&mut self, song: SongIndex, ctx: &ScoreContext<'_>) -> ScoreKey {
        let key = ctx.key(song);
        self.splay(key, ctx);
        key
    }

    // Top-down splay (Sleator & Tarjan).
    //
    // Walks from the root toward `key`, peeling nodes smaller than the key
    // into a left tree and larger ones into a right tree, rotating on
    // zig-zig steps. The last node reached becomes the root with the two
    // side trees hung beneath it. Keys are recomputed at every comparison.
    pub fn splay(&mut self, key: ScoreKey, ctx: &ScoreContext<'_>) {
        let Some(mut t) = self.root else {
            return;
        };

        let mut left_root: Option<NodeId> = None;
        let mut left_tail: Option<NodeId> = None;
        let mut right_root: Option<NodeId> = None;
        let mut right_tail: Option<NodeId> = None;

        loop {
            let t_key = self.key_of(t, ctx);

            if key < t_key {
                let Some(mut next) = self.node(t).left else {
                    break;
                };

                if key < self.key_of(next, ctx) {
                    // zig-zig: rotate right
                    self.node_mut(t).left = self.node(next).right;
                    self.node_mut(next).right = Some(t);
                    t = next;
                    match self.node(t).left {
                        Some(n) => next = n,
                        None => break,
                    }
                }

                // link t into the right tree
                match right_tail {
                    Some(r) => self.node_mut(r).left = Some(t),
                    None => right_root = Some(t),
                }
                right_tail = Some(t);
                t = next;
            } else if key > t_key {
                let Some(mut next) = self.node(t).right else {
                    break;
                };

                if key > self.key_of(next, ctx) {
                    // zag-zag: rotate left
                    self.node_mut(t).right = self.node(next).left;
                    self.node_mut(next).left = Some(t);
                    t = next;
                    match self.node(t).right {
                        Some(n) => next = n,
                        None => break,
                    }
                }

                // link t into the left tree
                match left_tail {
                    Some(l) => self.node_mut(l).right = Some(t),
                    None => left_root = Some(t),
                }
                left_tail = Some(t);
                t = next;
            } else {
                break;
            }
        }

        // reassemble
        let t_left = self.node(t).left;
        let t_right = self.node(t).right;
        if let Some(l) = left_tail {
            self.node_mut(l).right = t_left;
            self.node_mut(t).left = left_root;
        }
        if let Some(r) = right_tail {
            self.node_mut(r).left = t_right;
            self.node_mut(t).right = right_root;
        }
        self.root = Some(t);
    }

    /// In-order walk (ascending), keys computed at visit time
    pub fn traverse(&self, ctx: &ScoreContext<'_>) -> Vec<RankedSong> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut cur = self.root;

        while cur.is_some() || !stack.is_empty() {
            while let Some(id) = cur {
                stack.push(id);
                cur = self.node(id).left;
            }
            if let Some(id) = stack.pop() {
                let song = self.node(id).song;
                out.push(RankedSong {
                    song,
                    key: ctx.key(song),
                });
                cur = self.node(id).right;
            }
        }

        out
    }

    /// Reverse in-order walk (best first), stopping after `limit` songs
    pub fn top(&self, limit: usize, ctx: &ScoreContext<'_>) -> Vec<RankedSong> {
        let mut out = Vec::with_capacity(limit.min(self.nodes.len()));
        let mut stack = Vec::new();
        let mut cur = self.root;

        while out.len() < limit && (cur.is_some() || !stack.is_empty()) {
            while let Some(id) = cur {
                stack.push(id);
                cur = self.node(id).right;
            }
            if let Some(id) = stack.pop() {
                let song = self.node(id).song;
                out.push(RankedSong {
                    song,
                    key: ctx.key(song),
                });
                cur = self.node(id).left;
            }
        }

        out
    }

    /// Whether the in-order walk is non-decreasing under current keys
    pub fn is_sorted(&self, ctx: &ScoreContext<'_>) -> bool {
        self.traverse(ctx).windows(2).all(|w| w[0].key <= w[1].key)
    }

    /// Longest root-to-leaf path (0 for an empty tree)
    pub fn height(&self) -> usize {
        let mut best = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();

        while let Some((id, depth)) = stack.pop() {
            best = best.max(depth);
            let node = self.node(id);
            if let Some(l) = node.left {
                stack.push((l, depth + 1));
            }
            if let Some(r) = node.right {
                stack.push((r, depth + 1));
            }
        }

        best
    }

    // Throw away the current shape and build a balanced tree from a stable
    // sort of the current keys. Songs with equal keys keep their relative
    // in-order position.
    pub fn rebuild(&mut self, ctx: &ScoreContext<'_>) {
        let mut ranked = self.traverse(ctx);
        ranked.sort_by_key(|r| r.key);

        self.nodes.clear();
        self.root = self.build_balanced(&ranked);
    }

    fn build_balanced(&mut self, ranked: &[RankedSong]) -> Option<NodeId> {
        if ranked.is_empty() {
            return None;
        }

        let mid = ranked.len() / 2;
        let left = self.build_balanced(&ranked[..mid]);
        let right = self.build_balanced(&ranked[mid + 1..]);

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            song: ranked[mid].song,
            left,
            right,
        });
        Some(id)
    }

    fn key_of(&self, id: NodeId, ctx: &ScoreContext<'_>) -> ScoreKey {
        ctx.key(self.node(id).song)
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

/// Song searcher with fuzzy matching
///
/// Matches a query against "name - artist" of every song in the catalog.

use crate::catalog::{SongIndex, SongRegistry};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// A matched song and its fuzzy score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    pub song: SongIndex,
    pub score: i64,
}

/// Handles song searching with fuzzy matching
pub struct Searcher {
    matcher: SkimMatcherV2,
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Searcher {
    pub fn new() -> Self {
        Self {
            matcher: SkimMatcherV2::default().ignore_case(),
        }
    }

    /// Search songs by name and artist
    ///
    /// # Arguments
    /// * `registry` - Catalog to search
    /// * `query` - Search query
    /// * `limit` - Maximum results to return
    ///
    /// # Returns
    /// Hits sorted by score (highest first); equal scores keep catalog order
    pub fn search(&self, registry: &SongRegistry, query: &str, limit: usize) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<SearchHit> = registry
            .iter()
            .filter_map(|(idx, song)| {
                let haystack = format!("{} - {}", song.track_name, song.track_artist);
                self.matcher
                    .fuzzy_match(&haystack, query)
                    .map(|score| SearchHit { song: idx, score })
            })
            .collect();

        results.sort_by(|a, b| b.score.cmp(&a.score));
        results.truncate(limit);

        results
    }
}

use std::collections::HashMap;

use crate::history::HistoryArchive;

/// Outcome of one player's history fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedHistory {
    Loaded(HistoryArchive),
    /// The backend has no history for this player (404 or payload without series).
    Missing,
    Failed(String),
}

impl CachedHistory {
    pub fn archive(&self) -> Option<&HistoryArchive> {
        match self {
            CachedHistory::Loaded(archive) => Some(archive),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CachedHistory::Failed(_))
    }
}

/// Per-session rating histories keyed by player id.
///
/// Unbounded while a details session is open and emptied when it closes. Selector changes
/// read from here; only players without an entry are fetched.
#[derive(Debug, Clone, Default)]
pub struct HistoryCache {
    entries: HashMap<i64, CachedHistory>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player_id: i64) -> Option<&CachedHistory> {
        self.entries.get(&player_id)
    }

    pub fn contains(&self, player_id: i64) -> bool {
        self.entries.contains_key(&player_id)
    }

    /// A failed entry never replaces a loaded one.
    pub fn insert(&mut self, player_id: i64, entry: CachedHistory) {
        if entry.is_failed()
            && matches!(self.entries.get(&player_id), Some(CachedHistory::Loaded(_)))
        {
            return;
        }
        self.entries.insert(player_id, entry);
    }

    /// Ids from `wanted` that have no entry yet, in order and without duplicates.
    pub fn missing(&self, wanted: &[i64]) -> Vec<i64> {
        let mut out: Vec<i64> = Vec::new();
        for id in wanted {
            if !self.contains(*id) && !out.contains(id) {
                out.push(*id);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Forgets failed fetches so the next request retries them.
    pub fn drop_failed(&mut self) {
        self.entries.retain(|_, entry| !entry.is_failed());
    }
}

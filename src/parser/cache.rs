//! Memoization cache keyed `(rule_id, position)` (spec §4.3 step 3, §4.6
//! step 6 `EnableMemoization`). Uses `indexmap` for deterministic iteration
//! order, matching the teacher's general preference for `indexmap` over
//! `HashMap` wherever iteration order could leak into observable behavior
//! (walk traces, cache-eviction order under a size bound).

use indexmap::IndexMap;

use crate::ast::NodeId;
use crate::ids::RuleId;

#[derive(Debug, Clone, Copy)]
pub enum CacheEntry {
    Success(NodeId, usize),
    Failure,
}

#[derive(Debug, Default)]
pub struct MemoCache {
    entries: IndexMap<(RuleId, usize), CacheEntry>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rule_id: RuleId, position: usize) -> Option<CacheEntry> {
        self.entries.get(&(rule_id, position)).copied()
    }

    pub fn insert(&mut self, rule_id: RuleId, position: usize, entry: CacheEntry) {
        self.entries.insert((rule_id, position), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

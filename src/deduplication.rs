// 🔍 Deduplication Engine - collapse a scraped snapshot to unique identities
// The feed can list the same person twice (old and new contract line).
// The line with the latest end date wins.

use crate::record::{CompositeKey, Record};
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

// ============================================================================
// DUPLICATE GROUP REPORT
// ============================================================================

/// A composite key that appeared more than once in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub key: CompositeKey,

    /// How many rows shared the key
    pub occurrences: usize,

    /// End date of the row that was kept
    pub kept_end_date: i32,
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct DeduplicationEngine;

impl DeduplicationEngine {
    pub fn new() -> Self {
        DeduplicationEngine
    }

    /// Keep one record per composite key, the one with the greatest end date.
    ///
    /// Output keeps the position of each key's first appearance. Among rows
    /// with an equal end date the earliest one is kept.
    pub fn deduplicate(&self, records: &[Record]) -> Vec<Record> {
        self.deduplicate_with_report(records).0
    }

    /// Same as [`deduplicate`](Self::deduplicate), also reporting every collapsed key
    pub fn deduplicate_with_report(&self, records: &[Record]) -> (Vec<Record>, Vec<DuplicateGroup>) {
        let mut kept: Vec<Record> = Vec::with_capacity(records.len());
        let mut slots: HashMap<CompositeKey, (usize, usize)> = HashMap::with_capacity(records.len());

        for record in records {
            match slots.entry(record.key()) {
                Entry::Vacant(vacant) => {
                    vacant.insert((kept.len(), 1));
                    kept.push(record.clone());
                }
                Entry::Occupied(mut occupied) => {
                    let (slot, count) = occupied.get_mut();
                    *count += 1;
                    if record.end_date() > kept[*slot].end_date() {
                        kept[*slot] = record.clone();
                    }
                }
            }
        }

        let mut groups: Vec<DuplicateGroup> = slots
            .into_iter()
            .filter(|(_, (_, count))| *count > 1)
            .map(|(key, (slot, count))| DuplicateGroup {
                key,
                occurrences: count,
                kept_end_date: kept[slot].end_date(),
            })
            .collect();
        groups.sort_by(|a, b| a.key.cmp(&b.key));

        (kept, groups)
    }
}

// ============================================================================
// TESTS
// ============================================================================

// ⚖️ Reconciliation Engine - pair two roster snapshots by identity
//
// incoming (scraped) + persisted (stored)
//   → updated (old/new pairs) | added | removed
//
// Unchanged identities produce nothing.

use crate::deduplication::DeduplicationEngine;
use crate::record::{CompositeKey, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

// ============================================================================
// EMPTY SNAPSHOT GUARD
// ============================================================================

/// What to do when one of the two snapshots arrives empty.
///
/// An empty scrape usually means the feed broke, and an empty table usually
/// means a first run; both default to "report nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptySnapshotGuard {
    /// Either side empty → no changes at all
    #[default]
    EitherEmpty,

    /// Only an empty persisted snapshot short-circuits; an empty feed removes everything
    PersistedEmpty,

    /// No short-circuit
    Off,
}

impl EmptySnapshotGuard {
    fn short_circuits(&self, incoming_empty: bool, persisted_empty: bool) -> bool {
        match self {
            EmptySnapshotGuard::EitherEmpty => incoming_empty || persisted_empty,
            EmptySnapshotGuard::PersistedEmpty => persisted_empty,
            EmptySnapshotGuard::Off => false,
        }
    }
}

impl FromStr for EmptySnapshotGuard {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "either" => Ok(EmptySnapshotGuard::EitherEmpty),
            "persisted" => Ok(EmptySnapshotGuard::PersistedEmpty),
            "off" => Ok(EmptySnapshotGuard::Off),
            other => Err(format!("expected one of either, persisted, off; got '{}'", other)),
        }
    }
}

// ============================================================================
// CHANGE SET
// ============================================================================

/// Four-way partition of a reconciliation run.
///
/// `updated_old[i]` and `updated_new[i]` always describe the same identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    pub updated_old: Vec<Record>,
    pub updated_new: Vec<Record>,
    pub added: Vec<Record>,
    pub removed: Vec<Record>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.updated_new.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }

    /// (old, new) pairs in incoming order
    pub fn updated_pairs(&self) -> impl Iterator<Item = (&Record, &Record)> {
        self.updated_old.iter().zip(self.updated_new.iter())
    }

    pub fn summary(&self) -> String {
        format!(
            "{} updated, {} added, {} removed",
            self.updated_new.len(),
            self.added.len(),
            self.removed.len()
        )
    }

    fn log_contents(&self) {
        debug!("reconciled: {}", self.summary());
        for (old, new) in self.updated_pairs() {
            debug!(old = ?old.values(), new = ?new.values(), "updated");
        }
        for record in &self.removed {
            debug!(values = ?record.values(), "removed");
        }
        for record in &self.added {
            debug!(values = ?record.values(), "added");
        }
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    pub guard: EmptySnapshotGuard,
    dedup: DeduplicationEngine,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine::default()
    }

    pub fn with_guard(guard: EmptySnapshotGuard) -> Self {
        ReconciliationEngine {
            guard,
            dedup: DeduplicationEngine::new(),
        }
    }

    /// Deduplicate `incoming`, then partition it against `persisted`.
    ///
    /// `persisted` must already be unique by composite key (the table's
    /// primary key guarantees it).
    pub fn reconcile(&self, incoming: &[Record], persisted: &[Record]) -> ChangeSet {
        if self.guard.short_circuits(incoming.is_empty(), persisted.is_empty()) {
            warn!(
                incoming = incoming.len(),
                persisted = persisted.len(),
                guard = ?self.guard,
                "empty snapshot, skipping reconciliation"
            );
            return ChangeSet::default();
        }

        let (unique, duplicates) = self.dedup.deduplicate_with_report(incoming);
        for group in &duplicates {
            debug!(
                key = %group.key,
                occurrences = group.occurrences,
                kept_end_date = group.kept_end_date,
                "collapsed duplicate rows"
            );
        }

        let changes = self.partition(unique, persisted);
        changes.log_contents();
        changes
    }

    /// Key-indexed pairing of a unique incoming snapshot against the persisted one
    fn partition(&self, incoming: Vec<Record>, persisted: &[Record]) -> ChangeSet {
        let mut lookup: HashMap<CompositeKey, &Record> =
            persisted.iter().map(|r| (r.key(), r)).collect();
        let mut changes = ChangeSet::default();

        for record in incoming {
            match lookup.remove(&record.key()) {
                // Unchanged: skip and keep scanning
                Some(old) if *old == record => {}
                Some(old) => {
                    changes.updated_old.push(old.clone());
                    changes.updated_new.push(record);
                }
                None => changes.added.push(record),
            }
        }

        // Whatever was never matched left the roster, in persisted order
        changes.removed = persisted
            .iter()
            .filter(|r| lookup.contains_key(&r.key()))
            .cloned()
            .collect();

        changes
    }
}

// ============================================================================
// TESTS
// ============================================================================

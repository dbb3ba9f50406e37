// Roster Sync - Core Library
// Keeps a stored roster in step with the published feed and announces changes

pub mod record;         // Record, League, name normalization
pub mod deduplication;  // One row per person in a scraped snapshot
pub mod reconciliation; // Four-way diff of incoming vs persisted
pub mod classifier;     // Dominant change reason → notification
pub mod config;
pub mod error;
pub mod db;
pub mod feed;
pub mod profile;
pub mod webhook;
pub mod sync;

// Re-export commonly used types
pub use record::{normalize_name, parse_end_date, CompositeKey, League, Record, RecordFields};
pub use deduplication::{DeduplicationEngine, DuplicateGroup};
pub use reconciliation::{ChangeSet, EmptySnapshotGuard, ReconciliationEngine};
pub use classifier::{ChangeClassifier, ChangeReason, Notification, NotificationColor};
pub use config::Settings;
pub use error::SyncError;
pub use db::{
    open_database, setup_table, read_records, apply_changes, insert_records,
    reset_table, copy_table, renormalize_table, count_records, ApplyStats,
};
pub use feed::{parse_rows, CsvFeed, RosterSource};
pub use profile::{NoProfiles, Profile, ProfileLookup};
pub use webhook::{deliver_all, Notifier, WebhookPayload};
pub use sync::{run_sync, run_verify, Mode, SyncOptions, SyncOutcome, SyncTarget};

#[cfg(feature = "net")]
pub use feed::SpreadsheetFeed;
#[cfg(feature = "net")]
pub use profile::LiquipediaProfiles;
#[cfg(feature = "net")]
pub use webhook::WebhookNotifier;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 🔄 Sync Run - one pass of feed → table → notifications
//
// fetch incoming → read persisted → reconcile → write table → classify → deliver
//
// The table is written before anything is posted, so a delivery failure
// never leaves the stored roster behind the feed.

use crate::classifier::{ChangeClassifier, Notification};
use crate::config::Settings;
use crate::db::{self, ApplyStats};
use crate::error::SyncError;
use crate::feed::RosterSource;
use crate::profile::ProfileLookup;
use crate::reconciliation::{EmptySnapshotGuard, ReconciliationEngine};
use crate::webhook::{deliver_all, Notifier};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Which table and webhook a run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Live table, live webhook
    Live,
    /// Test table, test webhook
    Test,
    /// Test table refreshed from the live table first, test webhook
    Verify,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub table: String,
    pub webhook_url: String,
}

impl Mode {
    /// Table and webhook for this mode.
    ///
    /// Test runs without `WEBHOOK_URL_TEST` post to the live webhook, with a warning.
    pub fn target(&self, settings: &Settings) -> Result<SyncTarget, SyncError> {
        let live_url = || {
            settings
                .webhook_url
                .clone()
                .ok_or_else(|| SyncError::MissingVar("WEBHOOK_URL".to_string()))
        };

        match self {
            Mode::Live => Ok(SyncTarget {
                table: settings.table_name.clone(),
                webhook_url: live_url()?,
            }),
            Mode::Test | Mode::Verify => {
                let webhook_url = match &settings.webhook_url_test {
                    Some(url) => url.clone(),
                    None => {
                        warn!(mode = ?self, "WEBHOOK_URL_TEST is not set, posting to the live webhook");
                        live_url()?
                    }
                };
                Ok(SyncTarget {
                    table: settings.table_name_test.clone(),
                    webhook_url,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub guard: EmptySnapshotGuard,
    pub send_interval: Duration,
}

impl From<&Settings> for SyncOptions {
    fn from(settings: &Settings) -> Self {
        SyncOptions {
            guard: settings.empty_snapshot_guard,
            send_interval: settings.send_interval,
        }
    }
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub fetched: usize,
    pub persisted: usize,
    pub written: ApplyStats,
    pub notifications: usize,
    pub delivered: usize,
}

/// Reconcile the feed into `table` and announce what changed
pub fn run_sync(
    conn: &Connection,
    table: &str,
    source: &dyn RosterSource,
    profiles: &dyn ProfileLookup,
    notifier: &dyn Notifier,
    options: SyncOptions,
) -> Result<SyncOutcome> {
    let incoming = source
        .fetch()
        .with_context(|| format!("Failed to fetch {}", source.describe()))?;

    db::setup_table(conn, table)?;
    let persisted = db::read_records(conn, table)?;
    info!(
        source = %source.describe(),
        table,
        incoming = incoming.len(),
        persisted = persisted.len(),
        "snapshots loaded"
    );

    let changes = ReconciliationEngine::with_guard(options.guard).reconcile(&incoming, &persisted);
    let written = db::apply_changes(conn, table, &changes)?;

    let notifications: Vec<Notification> = ChangeClassifier::new().classify(&changes);
    let delivered = deliver_all(notifier, profiles, &notifications, options.send_interval)?;

    let outcome = SyncOutcome {
        fetched: incoming.len(),
        persisted: persisted.len(),
        written,
        notifications: notifications.len(),
        delivered,
    };
    info!(changes = %changes, delivered, "sync finished");
    Ok(outcome)
}

/// Refresh the test table with a copy of the live one, then sync it
pub fn run_verify(
    conn: &Connection,
    settings: &Settings,
    source: &dyn RosterSource,
    profiles: &dyn ProfileLookup,
    notifier: &dyn Notifier,
) -> Result<SyncOutcome> {
    let live = &settings.table_name;
    let test = &settings.table_name_test;

    db::setup_table(conn, live)?;
    db::setup_table(conn, test)?;
    db::reset_table(conn, test)?;
    let copied = db::copy_table(conn, live, test)?;
    info!(from = %live, to = %test, copied, "verify table prepared");

    run_sync(conn, test, source, profiles, notifier, SyncOptions::from(settings))
}

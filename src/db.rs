// 🗄️ Roster Store - SQLite persistence for the roster table
// One table per roster; identity is the (first_name, family_name) primary key.

use crate::config::valid_table_name;
use crate::deduplication::DeduplicationEngine;
use crate::reconciliation::ChangeSet;
use crate::record::{Record, COLUMN_COUNT};
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

const COLUMNS: &str = "league, team_name, handle_name, role, first_name, family_name, \
                       end_date, resident, roster_status, team_tag, team_contact_info";

/// Row counts written by [`apply_changes`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyStats {
    pub updated: usize,
    pub inserted: usize,
    pub deleted: usize,
}

pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    debug!(path = %path.display(), "database opened");
    Ok(conn)
}

/// Create the roster table if missing
pub fn setup_table(conn: &Connection, table: &str) -> Result<()> {
    let table = checked(table)?;
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                league TEXT,
                team_name TEXT,
                handle_name TEXT,
                role TEXT,
                first_name TEXT NOT NULL,
                family_name TEXT NOT NULL,
                end_date INTEGER NOT NULL,
                resident TEXT,
                roster_status TEXT,
                team_tag TEXT,
                team_contact_info TEXT,
                PRIMARY KEY (first_name, family_name)
            )"
        ),
        [],
    )
    .with_context(|| format!("Failed creating table {table}"))?;

    debug!(table, "create table or already exists");
    Ok(())
}

/// Every stored row as a [`Record`]
pub fn read_records(conn: &Connection, table: &str) -> Result<Vec<Record>> {
    let table = checked(table)?;
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM {table}"))?;

    let rows = stmt
        .query_map([], |row| {
            let mut values = Vec::with_capacity(COLUMN_COUNT);
            for i in 0..COLUMN_COUNT {
                let value = if i == 6 {
                    row.get::<_, i64>(i)?.to_string()
                } else {
                    row.get::<_, Option<String>>(i)?.unwrap_or_default()
                };
                values.push(value);
            }
            Ok(values)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("Failed reading table {table}"))?;

    let records = rows
        .iter()
        .map(|values| {
            Record::from_fields(values)
                .ok_or_else(|| anyhow!("Stored row has unknown league '{}' in {table}", values[0]))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(table, count = records.len(), "read table");
    Ok(records)
}

pub fn count_records(conn: &Connection, table: &str) -> Result<i64> {
    let table = checked(table)?;
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(count)
}

/// Write a reconciliation result: UPDATE by key, DELETE by key, INSERT new.
///
/// Runs in one SQL transaction; nothing is written if any statement fails.
pub fn apply_changes(conn: &Connection, table: &str, changes: &ChangeSet) -> Result<ApplyStats> {
    let table = checked(table)?;
    let tx = conn.unchecked_transaction()?;
    let mut stats = ApplyStats::default();

    {
        let mut update = tx.prepare(&format!(
            "UPDATE {table} SET league = ?1, team_name = ?2, handle_name = ?3, role = ?4,
                end_date = ?5, resident = ?6, roster_status = ?7, team_tag = ?8,
                team_contact_info = ?9
             WHERE first_name = ?10 AND family_name = ?11"
        ))?;
        for r in &changes.updated_new {
            let rows = update
                .execute(params![
                    r.league().code(),
                    r.team_name(),
                    r.handle_name(),
                    r.role(),
                    r.end_date(),
                    r.resident(),
                    r.roster_status(),
                    r.team_tag(),
                    r.team_contact_info(),
                    r.first_name(),
                    r.family_name(),
                ])
                .with_context(|| format!("Failed updating {}", r.key()))?;
            if rows == 0 {
                warn!(table, key = %r.key(), "update matched no stored row");
            }
            stats.updated += rows;
        }

        let mut delete = tx.prepare(&format!(
            "DELETE FROM {table} WHERE first_name = ?1 AND family_name = ?2"
        ))?;
        for r in &changes.removed {
            let rows = delete
                .execute(params![r.first_name(), r.family_name()])
                .with_context(|| format!("Failed deleting {}", r.key()))?;
            if rows == 0 {
                warn!(table, key = %r.key(), "delete matched no stored row");
            }
            stats.deleted += rows;
        }
    }

    stats.inserted = insert_records(&tx, table, &changes.added)?;
    tx.commit()?;

    info!(
        table,
        updated = stats.updated,
        inserted = stats.inserted,
        deleted = stats.deleted,
        "roster table written"
    );
    Ok(stats)
}

pub fn insert_records(conn: &Connection, table: &str, records: &[Record]) -> Result<usize> {
    let table = checked(table)?;
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {table} ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
    ))?;

    let mut inserted = 0;
    for r in records {
        inserted += stmt
            .execute(params![
                r.league().code(),
                r.team_name(),
                r.handle_name(),
                r.role(),
                r.first_name(),
                r.family_name(),
                r.end_date(),
                r.resident(),
                r.roster_status(),
                r.team_tag(),
                r.team_contact_info(),
            ])
            .with_context(|| format!("Failed inserting {}", r.key()))?;
    }

    Ok(inserted)
}

/// Delete every row of the table
pub fn reset_table(conn: &Connection, table: &str) -> Result<usize> {
    let table = checked(table)?;
    let deleted = conn
        .execute(&format!("DELETE FROM {table}"), [])
        .with_context(|| format!("Failed reset table data of {table}"))?;
    debug!(table, deleted, "reset table data");
    Ok(deleted)
}

/// Append every row of `from` into `to` (both must exist with the roster schema)
pub fn copy_table(conn: &Connection, from: &str, to: &str) -> Result<usize> {
    let from = checked(from)?;
    let to = checked(to)?;
    let copied = conn
        .execute(&format!("INSERT INTO {to} ({COLUMNS}) SELECT {COLUMNS} FROM {from}"), [])
        .with_context(|| format!("Failed copying {from} into {to}"))?;
    debug!(from, to, copied, "copied table");
    Ok(copied)
}

/// Rewrite the table with normalized names.
///
/// The current contents are first saved to `{table}_old`. Rows whose names
/// collapse onto the same key after normalization keep the latest end date.
pub fn renormalize_table(conn: &Connection, table: &str) -> Result<usize> {
    let table = checked(table)?;
    let backup = format!("{table}_old");
    let tx = conn.unchecked_transaction()?;

    setup_table(&tx, &backup)?;
    reset_table(&tx, &backup)?;
    copy_table(&tx, table, &backup)?;

    // Names are normalized while rows are turned into records
    let records = read_records(&tx, table)?;
    let unique = DeduplicationEngine::new().deduplicate(&records);

    reset_table(&tx, table)?;
    let written = insert_records(&tx, table, &unique)?;
    tx.commit()?;

    info!(table, backup = %backup, read = records.len(), written, "table normalized");
    Ok(written)
}

fn checked(table: &str) -> Result<&str> {
    valid_table_name(table.to_string())?;
    Ok(table)
}

// ⚙️ Settings - explicit run configuration
// Read once from `.env` + environment and passed down; nothing global.

use crate::error::SyncError;
use crate::reconciliation::EmptySnapshotGuard;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TARGET_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRmmWiBmMMD43m5VtZq54nKlmj0ZtythsA1qCpegwx-iRptx2HEsG0T3cQlG1r2AIiKxBWnaurJZQ9Q/pubhtml";
pub const DEFAULT_TABLE_NAME: &str = "VCTContractsTable";
pub const DEFAULT_TABLE_NAME_TEST: &str = "VCTContractsTableTest";
pub const DEFAULT_DATABASE_PATH: &str = "roster.db";
pub const DEFAULT_SEND_INTERVAL_SECS: u64 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub target_url: String,
    pub table_name: String,
    pub table_name_test: String,
    /// Required by any run that posts; `--normalize` does without
    pub webhook_url: Option<String>,
    pub webhook_url_test: Option<String>,
    pub send_interval: Duration,
    pub empty_snapshot_guard: EmptySnapshotGuard,
}

impl Settings {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Result<Self, SyncError> {
        dotenvy::dotenv().ok();
        Settings::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let table_name = valid_table_name(get("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()))?;
        let table_name_test =
            valid_table_name(get("TABLE_NAME_TEST").unwrap_or_else(|| DEFAULT_TABLE_NAME_TEST.to_string()))?;

        let send_interval = match get("SEND_INTERVAL_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse::<u64>().map_err(|_| SyncError::InvalidVar {
                name: "SEND_INTERVAL_SECS".to_string(),
                value: raw.clone(),
                reason: "expected a whole number of seconds".to_string(),
            })?),
            None => Duration::from_secs(DEFAULT_SEND_INTERVAL_SECS),
        };

        let empty_snapshot_guard = match get("EMPTY_SNAPSHOT_GUARD") {
            Some(raw) => raw.parse::<EmptySnapshotGuard>().map_err(|reason| SyncError::InvalidVar {
                name: "EMPTY_SNAPSHOT_GUARD".to_string(),
                value: raw.clone(),
                reason,
            })?,
            None => EmptySnapshotGuard::default(),
        };

        Ok(Settings {
            database_path: PathBuf::from(get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())),
            target_url: get("TARGET_URL").unwrap_or_else(|| DEFAULT_TARGET_URL.to_string()),
            table_name,
            table_name_test,
            webhook_url: get("WEBHOOK_URL"),
            webhook_url_test: get("WEBHOOK_URL_TEST"),
            send_interval,
            empty_snapshot_guard,
        })
    }
}

/// Table names end up inside SQL text, so only plain identifiers pass
pub fn valid_table_name(name: String) -> Result<String, SyncError> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name)
    } else {
        Err(SyncError::InvalidTableName(name))
    }
}

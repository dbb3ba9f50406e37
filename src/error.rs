use thiserror::Error;

/// Failures callers may want to tell apart. Everything else travels as `anyhow::Error`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0} is not set")]
    MissingVar(String),

    #[error("{name}='{value}' is invalid: {reason}")]
    InvalidVar {
        name: String,
        value: String,
        reason: String,
    },

    #[error("table name '{0}' must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidTableName(String),

    #[error("webhook rejected message with status {status}: {body}")]
    Delivery { status: u16, body: String },
}

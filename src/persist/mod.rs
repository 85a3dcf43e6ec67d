pub mod registry;
pub mod sqlite;

use std::path::PathBuf;

use crate::{
    attendee::{AttendanceRecord, Registration},
    types::TicketId,
};

/// Storage failures from either database.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// SQLite driver error.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Filesystem error, e.g. creating the journal directory.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// No registration file or no `registrations` table at the path.
    #[error("registration dataset not provisioned at {}", .0.display())]
    RegistrationMissing(PathBuf),
    /// Persisted rows contradict the one-record-per-ticket rule.
    #[error("corrupt row: {0}")]
    Corrupt(String),
    /// Anything else, such as a failed blocking task.
    #[error("{0}")]
    Message(String),
}

impl From<crate::core::store::StoreError> for PersistError {
    fn from(value: crate::core::store::StoreError) -> Self {
        Self::Corrupt(format!("store error: {value}"))
    }
}

/// Result alias for persistence calls.
pub type PersistResult<T> = Result<T, PersistError>;

/// Outcome of a uniqueness-guarded insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written.
    Inserted,
    /// Another writer already holds this ticket; its row is returned.
    Existing(AttendanceRecord),
}

/// Durable backing for the attendance ledger.
pub trait AttendanceSink: Send {
    /// Writes `record` unless a row for its ticket already exists.
    fn insert_once(&mut self, record: &AttendanceRecord) -> PersistResult<InsertOutcome>;

    /// Every persisted record, oldest scan first.
    fn load_all(&self) -> PersistResult<Vec<AttendanceRecord>>;

    /// Pushes buffered writes to stable storage.
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}

/// Read-only registration dataset.
pub trait RegistrationLookup: Send + Sync {
    /// `Ok(None)` when the ticket is not registered; `Err` only for storage failures.
    fn find(&self, ticket: &TicketId) -> PersistResult<Option<Registration>>;
}

//! Read-only registration dataset backends.

use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::{attendee::Registration, types::TicketId};

use super::{PersistError, PersistResult, RegistrationLookup};

/// Counts reported by [`SqliteRegistry::import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows written.
    pub inserted: usize,
    /// Rows ignored: blank ticket number or already present.
    pub skipped: usize,
}

/// Registration lookup over the `registrations` table of a SQLite file.
///
/// Every query opens its own read-only connection, so concurrent callers
/// never contend on a shared handle.
#[derive(Debug, Clone)]
pub struct SqliteRegistry {
    path: PathBuf,
}

impl SqliteRegistry {
    /// Validates that the dataset exists and carries a `registrations` table.
    ///
    /// Returns [`PersistError::RegistrationMissing`] otherwise; the service
    /// must not accept scans without it.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(PersistError::RegistrationMissing(path));
        }

        let registry = Self { path };
        let conn = registry.connect()?;
        let tables: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'registrations'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(PersistError::RegistrationMissing(registry.path));
        }
        Ok(registry)
    }

    /// Populates (or extends) the dataset at `path` with `INSERT OR IGNORE`.
    pub fn import(
        path: impl AsRef<Path>,
        rows: impl IntoIterator<Item = Registration>,
    ) -> PersistResult<ImportSummary> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(path)?;
        conn.execute_batch(include_str!("registrations.sql"))?;

        let mut summary = ImportSummary::default();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO registrations(ticket_number, first_name, last_name) VALUES (?1, ?2, ?3)",
            )?;
            for row in rows {
                let ticket = row.ticket_number.as_str().trim();
                if ticket.is_empty() {
                    summary.skipped += 1;
                    continue;
                }
                let changed = stmt.execute(params![
                    ticket,
                    row.first_name.trim(),
                    row.last_name.trim(),
                ])?;
                if changed > 0 {
                    summary.inserted += 1;
                } else {
                    summary.skipped += 1;
                }
            }
        }
        tx.commit()?;
        Ok(summary)
    }

    /// Dataset file backing this registry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of registered tickets.
    pub fn count(&self) -> PersistResult<usize> {
        let n: i64 = self
            .connect()?
            .query_row("SELECT COUNT(*) FROM registrations", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn connect(&self) -> PersistResult<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }
}

impl RegistrationLookup for SqliteRegistry {
    fn find(&self, ticket: &TicketId) -> PersistResult<Option<Registration>> {
        let conn = self.connect()?;
        let reg = conn
            .query_row(
                "SELECT ticket_number, first_name, last_name FROM registrations WHERE ticket_number = ?1 LIMIT 1",
                params![ticket.as_str()],
                |row| {
                    let ticket: String = row.get(0)?;
                    let first_name: Option<String> = row.get(1)?;
                    let last_name: Option<String> = row.get(2)?;
                    Ok(Registration {
                        ticket_number: TicketId::new(ticket),
                        first_name: first_name.unwrap_or_default(),
                        last_name: last_name.unwrap_or_default(),
                    })
                },
            )
            .optional()?;
        Ok(reg)
    }
}

/// Registration lookup over a fixed in-memory table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    rows: HashMap<TicketId, Registration>,
}

impl InMemoryRegistry {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no one is registered.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<Registration> for InMemoryRegistry {
    fn from_iter<I: IntoIterator<Item = Registration>>(iter: I) -> Self {
        let mut rows = HashMap::new();
        for reg in iter {
            rows.entry(reg.ticket_number.clone()).or_insert(reg);
        }
        Self { rows }
    }
}

impl RegistrationLookup for InMemoryRegistry {
    fn find(&self, ticket: &TicketId) -> PersistResult<Option<Registration>> {
        Ok(self.rows.get(ticket).cloned())
    }
}

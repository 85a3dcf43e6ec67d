//! SQLite-backed write-once attendance journal.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::{
    attendee::AttendanceRecord,
    core::store::AttendanceStore,
    types::{TicketId, format_scan_time, parse_scan_time},
};

use super::{AttendanceSink, InsertOutcome, PersistError, PersistResult};

const SELECT_COLUMNS: &str = "SELECT ticket_number, attendee_name, scan_time_utc, raw_qr FROM attendance_log";

/// SQLite implementation of [`crate::persist::AttendanceSink`].
///
/// `ticket_number` carries a UNIQUE constraint, so a second writer on the
/// same file can never create a second row for a ticket.
pub struct SqliteAttendanceSink {
    conn: Connection,
}

impl SqliteAttendanceSink {
    /// Opens or creates the attendance database at `path`.
    ///
    /// Creates the parent directory when missing, enables WAL mode and sets
    /// `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory attendance database.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("attendance.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Rebuilds the in-memory index from every persisted row.
    pub fn load_store(&self) -> PersistResult<AttendanceStore> {
        let records = self.load_all()?;
        Ok(AttendanceStore::from_records(records)?)
    }

    /// Persisted record for `ticket`, if any.
    pub fn find(&self, ticket: &TicketId) -> PersistResult<Option<AttendanceRecord>> {
        let rec = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE ticket_number = ?1"),
                params![ticket.as_str()],
                record_from_row,
            )
            .optional()?;
        Ok(rec)
    }

    /// Number of persisted attendance rows.
    pub fn count(&self) -> PersistResult<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM attendance_log", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl AttendanceSink for SqliteAttendanceSink {
    fn insert_once(&mut self, record: &AttendanceRecord) -> PersistResult<InsertOutcome> {
        let changed = self.conn.execute(
            "INSERT INTO attendance_log(ticket_number, attendee_name, scan_time_utc, raw_qr)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(ticket_number) DO NOTHING",
            params![
                record.ticket_number.as_str(),
                record.attendee_name,
                format_scan_time(&record.scan_time),
                record.raw_qr,
            ],
        )?;
        if changed > 0 {
            return Ok(InsertOutcome::Inserted);
        }

        // Lost the race on the unique key: adopt the winner's row.
        let existing = self.find(&record.ticket_number)?.ok_or_else(|| {
            PersistError::Message(format!(
                "insert conflict for {} but no row found",
                record.ticket_number
            ))
        })?;
        Ok(InsertOutcome::Existing(existing))
    }

    fn load_all(&self) -> PersistResult<Vec<AttendanceRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY scan_time_utc ASC, id ASC"))?;
        let rows = stmt.query_map([], record_from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn flush(&mut self) -> PersistResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AttendanceRecord> {
    let ticket: String = row.get(0)?;
    let attendee_name: Option<String> = row.get(1)?;
    let scan_time_raw: String = row.get(2)?;
    let raw_qr: Option<String> = row.get(3)?;
    let scan_time = parse_scan_time(&scan_time_raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("ticket {ticket}: scan time {scan_time_raw:?}: {err}").into(),
        )
    })?;
    Ok(AttendanceRecord {
        ticket_number: TicketId::new(ticket),
        attendee_name: attendee_name.unwrap_or_default(),
        scan_time,
        raw_qr: raw_qr.unwrap_or_default(),
    })
}

//! Registration and attendance record types.

use serde::{Deserialize, Serialize};

use crate::types::{ScanTime, TicketId};

/// One row of the pre-imported registration dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Unique ticket identifier.
    pub ticket_number: TicketId,
    /// Given name as registered.
    pub first_name: String,
    /// Family name as registered.
    pub last_name: String,
}

impl Registration {
    /// Display name, `"<first> <last>"` with outer whitespace removed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Write-once attendance mark for a single ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Ticket that was checked in.
    pub ticket_number: TicketId,
    /// Attendee display name captured at check-in.
    pub attendee_name: String,
    /// Instant of the first successful scan.
    pub scan_time: ScanTime,
    /// Trimmed QR payload of the first successful scan.
    pub raw_qr: String,
}

impl AttendanceRecord {
    /// Record for a ticket's first successful scan.
    pub fn new(
        ticket_number: TicketId,
        attendee_name: impl Into<String>,
        scan_time: ScanTime,
        raw_qr: impl Into<String>,
    ) -> Self {
        Self {
            ticket_number,
            attendee_name: attendee_name.into(),
            scan_time,
            raw_qr: raw_qr.into(),
        }
    }
}

/// Result of an idempotent mark-present call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkOutcome {
    /// True when this call created the record.
    pub created: bool,
    /// The record now held by the ledger (new or pre-existing).
    pub record: AttendanceRecord,
}

impl MarkOutcome {
    /// Outcome for a record this call wrote.
    pub fn created(record: AttendanceRecord) -> Self {
        Self {
            created: true,
            record,
        }
    }

    /// Outcome for a ticket that was already present.
    pub fn duplicate(record: AttendanceRecord) -> Self {
        Self {
            created: false,
            record,
        }
    }
}

use hashbrown::HashMap;

use crate::{
    attendee::{AttendanceRecord, MarkOutcome},
    types::{ScanTime, TicketId},
};

/// Index invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A second record was offered for a ticket already present.
    #[error("attendance already recorded for {0}")]
    AlreadyExists(TicketId),
}

/// In-memory attendance index; at most one record per ticket.
///
/// Not synchronized. The ledger runtime owns the only instance and is the
/// single writer.
#[derive(Debug, Default)]
pub struct AttendanceStore {
    records: HashMap<TicketId, AttendanceRecord>,
    order: Vec<TicketId>,
}

impl AttendanceStore {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the index from persisted rows, rejecting duplicate tickets.
    pub fn from_records(
        records: impl IntoIterator<Item = AttendanceRecord>,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for rec in records {
            store.insert(rec)?;
        }
        Ok(store)
    }

    /// Record for `ticket`, if present.
    pub fn get(&self, ticket: &TicketId) -> Option<&AttendanceRecord> {
        self.records.get(ticket)
    }

    /// Owned copy of the record for `ticket`.
    pub fn get_cloned(&self, ticket: &TicketId) -> Option<AttendanceRecord> {
        self.get(ticket).cloned()
    }

    /// Adds a record; fails if the ticket is already present.
    pub fn insert(&mut self, rec: AttendanceRecord) -> Result<(), StoreError> {
        if self.records.contains_key(&rec.ticket_number) {
            return Err(StoreError::AlreadyExists(rec.ticket_number));
        }
        self.order.push(rec.ticket_number.clone());
        self.records.insert(rec.ticket_number.clone(), rec);
        Ok(())
    }

    /// Outcome for a ticket that is already present, if it is.
    pub fn duplicate_of(&self, ticket: &TicketId) -> Option<MarkOutcome> {
        self.get(ticket).cloned().map(MarkOutcome::duplicate)
    }

    /// First-write-wins mark against the index alone.
    pub fn mark(
        &mut self,
        ticket: TicketId,
        raw_qr: &str,
        attendee_name: &str,
        now: ScanTime,
    ) -> MarkOutcome {
        if let Some(existing) = self.duplicate_of(&ticket) {
            return existing;
        }

        let record = AttendanceRecord::new(ticket, attendee_name, now, raw_qr);
        self.order.push(record.ticket_number.clone());
        self.records
            .insert(record.ticket_number.clone(), record.clone());
        MarkOutcome::created(record)
    }

    /// Number of tickets present.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nobody has been marked present.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Tickets in insertion order.
    pub fn ordered_tickets(&self) -> &[TicketId] {
        &self.order
    }

    /// All records sorted by scan time ascending; ties keep insertion order.
    pub fn export_sorted(&self) -> Vec<AttendanceRecord> {
        let mut out: Vec<AttendanceRecord> = self
            .order
            .iter()
            .filter_map(|t| self.records.get(t).cloned())
            .collect();
        out.sort_by_key(|r| r.scan_time);
        out
    }
}

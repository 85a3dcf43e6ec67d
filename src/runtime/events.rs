//! Ledger event stream payloads.

use crate::types::TicketId;

/// Events emitted from the single-writer ledger loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    /// A ticket was marked present for the first time.
    Marked {
        /// Ticket now recorded.
        ticket: TicketId,
    },
    /// A mark-present call hit an existing record.
    Duplicate {
        /// Ticket already recorded.
        ticket: TicketId,
    },
}

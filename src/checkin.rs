//! Scan workflow: codec, then registration lookup, then the attendance ledger.

use std::sync::Arc;

use tracing::{debug, error};

use crate::{
    attendee::{AttendanceRecord, Registration},
    codec::TicketCodec,
    persist::{PersistError, PersistResult, RegistrationLookup},
    runtime::handle::{LedgerError, LedgerHandle},
    types::{ScanTime, TicketId},
};

const LOG_SNIPPET_CHARS: usize = 50;

/// Component whose storage failure ended a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    /// Registration dataset query.
    Lookup,
    /// Attendance ledger write.
    Attendance,
}

/// Terminal classification of one scan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Payload is not a ticket QR.
    Rejected {
        /// Trimmed payload.
        raw_qr: String,
    },
    /// Ticket is well formed but not registered.
    NotFound {
        /// Derived ticket.
        ticket: TicketId,
        /// Trimmed payload.
        raw_qr: String,
    },
    /// First successful scan; attendance newly recorded.
    Created {
        /// Derived ticket.
        ticket: TicketId,
        /// Registered display name.
        attendee_name: String,
        /// Instant the record was created.
        scan_time: ScanTime,
        /// Trimmed payload.
        raw_qr: String,
    },
    /// Already present; nothing written.
    Duplicate {
        /// Derived ticket.
        ticket: TicketId,
        /// Registered display name.
        attendee_name: String,
        /// Instant of the original check-in.
        scan_time: ScanTime,
        /// Trimmed payload.
        raw_qr: String,
    },
    /// A storage failure prevented completing the scan.
    Failed {
        /// Failing component.
        stage: ScanStage,
        /// Derived ticket.
        ticket: TicketId,
        /// Trimmed payload.
        raw_qr: String,
    },
}

impl ScanOutcome {
    /// Wire status string.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "INVALID_FORMAT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Created { .. } => "OK",
            Self::Duplicate { .. } => "DUPLICATE",
            Self::Failed { .. } => "ERROR",
        }
    }

    /// Trimmed payload the outcome refers to.
    pub fn raw_qr(&self) -> &str {
        match self {
            Self::Rejected { raw_qr }
            | Self::NotFound { raw_qr, .. }
            | Self::Created { raw_qr, .. }
            | Self::Duplicate { raw_qr, .. }
            | Self::Failed { raw_qr, .. } => raw_qr,
        }
    }

    /// Derived ticket, absent only for rejected payloads.
    pub fn ticket(&self) -> Option<&TicketId> {
        match self {
            Self::Rejected { .. } => None,
            Self::NotFound { ticket, .. }
            | Self::Created { ticket, .. }
            | Self::Duplicate { ticket, .. }
            | Self::Failed { ticket, .. } => Some(ticket),
        }
    }
}

/// Check-in orchestrator over explicitly injected storage handles.
#[derive(Clone)]
pub struct CheckinService {
    codec: TicketCodec,
    registry: Arc<dyn RegistrationLookup>,
    ledger: LedgerHandle,
}

impl CheckinService {
    /// Service over the given codec, registration dataset and ledger.
    pub fn new(
        codec: TicketCodec,
        registry: Arc<dyn RegistrationLookup>,
        ledger: LedgerHandle,
    ) -> Self {
        Self {
            codec,
            registry,
            ledger,
        }
    }

    /// Processes one scan end to end. Never retries and never errors:
    /// storage failures become [`ScanOutcome::Failed`].
    pub async fn scan(&self, raw: &str) -> ScanOutcome {
        let raw_qr = raw.trim().to_string();
        let snippet: String = raw_qr.chars().take(LOG_SNIPPET_CHARS).collect();
        debug!(raw_len = raw_qr.len(), snippet = %snippet, "scan received");

        let Some(ticket) = self.codec.derive(&raw_qr) else {
            debug!("scan payload is not a ticket code");
            return ScanOutcome::Rejected { raw_qr };
        };

        let registration = match self.find_registration(ticket.clone()).await {
            Ok(Some(reg)) => reg,
            Ok(None) => {
                debug!(ticket = %ticket, "ticket not registered");
                return ScanOutcome::NotFound { ticket, raw_qr };
            }
            Err(err) => {
                error!(ticket = %ticket, error = %err, "registration lookup failed");
                return ScanOutcome::Failed {
                    stage: ScanStage::Lookup,
                    ticket,
                    raw_qr,
                };
            }
        };

        let attendee_name = registration.full_name();
        match self
            .ledger
            .mark_present(ticket.clone(), raw_qr.clone(), attendee_name.clone())
            .await
        {
            Ok(outcome) if outcome.created => ScanOutcome::Created {
                ticket,
                attendee_name,
                scan_time: outcome.record.scan_time,
                raw_qr,
            },
            Ok(outcome) => ScanOutcome::Duplicate {
                ticket,
                attendee_name,
                scan_time: outcome.record.scan_time,
                raw_qr,
            },
            Err(err) => {
                error!(ticket = %ticket, error = %err, "attendance write failed");
                ScanOutcome::Failed {
                    stage: ScanStage::Attendance,
                    ticket,
                    raw_qr,
                }
            }
        }
    }

    /// Registration row for `ticket`.
    pub async fn attendee(&self, ticket: TicketId) -> PersistResult<Option<Registration>> {
        self.find_registration(ticket).await
    }

    /// Number of attendees marked present.
    pub async fn present_count(&self) -> Result<usize, LedgerError> {
        self.ledger.count().await
    }

    /// Attendance records ordered by scan time ascending.
    pub async fn export(&self) -> Result<Vec<AttendanceRecord>, LedgerError> {
        self.ledger.export_all().await
    }

    /// Flushes and stops the ledger.
    pub async fn shutdown(&self) -> Result<(), LedgerError> {
        self.ledger.shutdown().await
    }

    async fn find_registration(&self, ticket: TicketId) -> PersistResult<Option<Registration>> {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || registry.find(&ticket))
            .await
            .map_err(|e| PersistError::Message(format!("join error: {e}")))?
    }
}

//! Shared primitive identifiers and time helpers.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Absolute UTC instant at which an attendee was first marked present.
pub type ScanTime = DateTime<Utc>;

/// Canonical ticket identifier, e.g. `GOOGA261700489`.
///
/// Ticket ids are string-typed: leading zeros in the digit part are
/// significant and never normalized away.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Wraps an already-canonical ticket string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id, returning the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TicketId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Current instant at the precision the journal stores (microseconds).
pub fn now_utc() -> ScanTime {
    Utc::now().trunc_subsecs(6)
}

/// Renders a scan time in the on-disk and wire form (`2025-11-20T09:15:02.123456Z`).
///
/// Fixed-width microsecond precision keeps the text lexicographically ordered.
pub fn format_scan_time(ts: &ScanTime) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored scan time.
///
/// Offset-less rows (`2025-11-20T09:15:02.123456`) written by older check-in
/// desks are read as UTC.
pub fn parse_scan_time(raw: &str) -> Result<ScanTime, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|err| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .map_err(|_| err)
        })
}

//! Ticket codec: raw QR payload to canonical [`TicketId`].
//!
//! Badge QR codes carry `<order>:<ticket digits>`, e.g. `87189:1700489`.
//! The canonical id is the event prefix followed by the digits verbatim.

use crate::types::TicketId;

/// Prefix used by the default event deployment.
pub const DEFAULT_TICKET_PREFIX: &str = "GOOGA26";

/// Separator between the order segment and the ticket digits.
pub const SEPARATOR: char = ':';

/// Pure payload-to-ticket mapping parameterized by the event prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketCodec {
    prefix: String,
}

impl Default for TicketCodec {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_TICKET_PREFIX)
    }
}

impl TicketCodec {
    /// Codec emitting ids that start with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Configured ticket prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derives the ticket id, or `None` when the payload is not a ticket QR.
    ///
    /// Only the first separator splits the payload; the left segment is
    /// ignored. The right segment must be non-empty ASCII digits after
    /// trimming surrounding whitespace.
    pub fn derive(&self, raw: &str) -> Option<TicketId> {
        let (_, right) = raw.split_once(SEPARATOR)?;
        let digits = right.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(TicketId::new(format!("{}{digits}", self.prefix)))
    }
}

/// Derives a ticket id using [`DEFAULT_TICKET_PREFIX`].
pub fn derive_ticket_id(raw: &str) -> Option<TicketId> {
    TicketCodec::default().derive(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_badge_payload() {
        assert_eq!(
            derive_ticket_id("87189:1700489").map(TicketId::into_inner),
            Some("GOOGA261700489".to_string())
        );
    }

    #[test]
    fn rejects_missing_separator() {
        assert_eq!(derive_ticket_id("no-colon-here"), None);
        assert_eq!(derive_ticket_id(""), None);
    }

    #[test]
    fn trims_right_segment_and_keeps_leading_zeros() {
        assert_eq!(
            derive_ticket_id("1: 0042 \t").map(TicketId::into_inner),
            Some("GOOGA260042".to_string())
        );
    }

    #[test]
    fn rejects_blank_or_non_numeric_right_segment() {
        assert_eq!(derive_ticket_id("87189:"), None);
        assert_eq!(derive_ticket_id("87189:   "), None);
        assert_eq!(derive_ticket_id("87189:12a4"), None);
        assert_eq!(derive_ticket_id("87189:-12"), None);
    }

    #[test]
    fn splits_on_first_separator_only() {
        assert_eq!(derive_ticket_id("a:1:2"), None);
        assert_eq!(
            derive_ticket_id(":123").map(TicketId::into_inner),
            Some("GOOGA26123".to_string())
        );
    }

    #[test]
    fn custom_prefix() {
        let codec = TicketCodec::with_prefix("EVT");
        assert_eq!(codec.prefix(), "EVT");
        assert_eq!(codec.derive("9:01"), Some(TicketId::new("EVT01")));
    }
}

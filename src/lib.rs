//! Event check-in: QR payload to ticket id, registration lookup, and a
//! write-once attendance ledger journaled to SQLite.
//!
//! # Examples
//!
//! Deriving a ticket id from a badge payload:
//! ```
//! use qrcheckin::codec::derive_ticket_id;
//!
//! let ticket = derive_ticket_id("87189:1700489").expect("ticket");
//! assert_eq!(ticket.as_str(), "GOOGA261700489");
//! assert!(derive_ticket_id("no-colon-here").is_none());
//! ```
//!
//! Scanning against an in-memory registration table:
//! ```
//! use std::sync::Arc;
//!
//! use qrcheckin::{
//!     attendee::Registration,
//!     checkin::{CheckinService, ScanOutcome},
//!     codec::TicketCodec,
//!     core::store::AttendanceStore,
//!     persist::registry::InMemoryRegistry,
//!     runtime::handle::{spawn_ledger, RuntimeConfig},
//!     types::TicketId,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let registry: InMemoryRegistry = [Registration {
//!     ticket_number: TicketId::new("GOOGA261700489"),
//!     first_name: "Jane".to_string(),
//!     last_name: "Doe".to_string(),
//! }]
//! .into_iter()
//! .collect();
//! let ledger = spawn_ledger(AttendanceStore::new(), None, RuntimeConfig::default());
//! let service = CheckinService::new(TicketCodec::default(), Arc::new(registry), ledger);
//!
//! assert!(matches!(service.scan("87189:1700489").await, ScanOutcome::Created { .. }));
//! assert!(matches!(service.scan("87189:1700489").await, ScanOutcome::Duplicate { .. }));
//! service.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Registration and attendance record types.
pub mod attendee;
/// Scan orchestration over codec, registry and ledger.
pub mod checkin;
/// QR payload to ticket id derivation.
pub mod codec;
/// Environment-driven configuration.
pub mod config;
/// In-memory attendance index.
pub mod core;
/// Logging setup.
pub mod logger;
/// Persistence seams and SQLite implementations.
pub mod persist;
/// Single-writer ledger runtime handle and events.
pub mod runtime;
/// axum HTTP surface.
pub mod server;
/// Shared primitive types.
pub mod types;

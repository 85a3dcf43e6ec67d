//! In-memory attendance index.

/// Authoritative attendance store owned by the ledger writer.
pub mod store;

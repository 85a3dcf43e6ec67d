//! Single-writer attendance ledger runtime and event stream APIs.

/// Event stream types emitted by the ledger.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;

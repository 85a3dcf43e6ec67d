use std::{path::Path, sync::Arc};

use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tracing::{debug, info};

use crate::{
    attendee::{AttendanceRecord, MarkOutcome},
    core::store::{AttendanceStore, StoreError},
    persist::{AttendanceSink, InsertOutcome, PersistError, sqlite::SqliteAttendanceSink},
    types::{TicketId, now_utc},
};

use super::events::LedgerEvent;

/// Failures reported by [`LedgerHandle`] calls.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// In-memory index rejected the record.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Journal write or replay failed.
    #[error(transparent)]
    Persist(#[from] PersistError),
    /// The writer task has stopped.
    #[error("ledger runtime is not running")]
    ChannelClosed,
}

/// Channel sizing for the ledger writer.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Bound of the command queue in front of the writer.
    pub queue_bound: usize,
    /// Capacity of the broadcast event channel.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

/// Cloneable handle to the attendance ledger.
///
/// Every command is processed by one writer task in arrival order, so the
/// existence check and the insert of a mark-present call can never
/// interleave with another caller's.
#[derive(Clone)]
pub struct LedgerHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<LedgerEvent>,
}

type SharedSink = Arc<Mutex<Box<dyn AttendanceSink>>>;

enum Command {
    MarkPresent {
        ticket: TicketId,
        raw_qr: String,
        attendee_name: String,
        resp: oneshot::Sender<Result<MarkOutcome, LedgerError>>,
    },
    Get {
        ticket: TicketId,
        resp: oneshot::Sender<Option<AttendanceRecord>>,
    },
    Count {
        resp: oneshot::Sender<usize>,
    },
    Export {
        resp: oneshot::Sender<Vec<AttendanceRecord>>,
    },
    Flush {
        resp: oneshot::Sender<Result<(), LedgerError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), LedgerError>>,
    },
}

/// Starts the writer task over `store`, journaling through `sink` when given.
///
/// Must be called inside a tokio runtime.
pub fn spawn_ledger(
    store: AttendanceStore,
    sink: Option<Box<dyn AttendanceSink>>,
    config: RuntimeConfig,
) -> LedgerHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<LedgerEvent>(config.event_capacity.max(1));

    let events_tx_loop = events_tx.clone();
    let sink: Option<SharedSink> = sink.map(|s| Arc::new(Mutex::new(s)));

    tokio::spawn(async move {
        let mut store = store;
        while let Some(cmd) = cmd_rx.recv().await {
            let done = handle_command(cmd, &mut store, sink.as_ref(), &events_tx_loop).await;
            if done {
                break;
            }
        }
        debug!(present = store.len(), "attendance ledger stopped");
    });

    LedgerHandle { cmd_tx, events_tx }
}

/// Opens the SQLite journal at `path`, replays it and starts the writer.
pub async fn spawn_sqlite_ledger(
    path: impl AsRef<Path>,
    config: RuntimeConfig,
) -> Result<LedgerHandle, LedgerError> {
    let path = path.as_ref().to_path_buf();
    let (sink, store) = tokio::task::spawn_blocking(move || {
        let sink = SqliteAttendanceSink::open(&path)?;
        let store = sink.load_store()?;
        Result::<_, PersistError>::Ok((sink, store))
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))??;

    info!(present = store.len(), "attendance ledger loaded");
    Ok(spawn_ledger(store, Some(Box::new(sink)), config))
}

impl LedgerHandle {
    /// New receiver for [`LedgerEvent`]s emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events_tx.subscribe()
    }

    /// Records `ticket` as present unless it already is.
    ///
    /// Returns `created = false` and the original record for repeat scans.
    pub async fn mark_present(
        &self,
        ticket: TicketId,
        raw_qr: impl Into<String>,
        attendee_name: impl Into<String>,
    ) -> Result<MarkOutcome, LedgerError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::MarkPresent {
                ticket,
                raw_qr: raw_qr.into(),
                attendee_name: attendee_name.into(),
                resp: tx,
            })
            .await
            .map_err(|_| LedgerError::ChannelClosed)?;
        rx.await.map_err(|_| LedgerError::ChannelClosed)?
    }

    /// Record for `ticket`, if present.
    pub async fn get(&self, ticket: TicketId) -> Result<Option<AttendanceRecord>, LedgerError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Get { ticket, resp: tx })
            .await
            .map_err(|_| LedgerError::ChannelClosed)?;
        rx.await.map_err(|_| LedgerError::ChannelClosed)
    }

    /// Number of distinct tickets marked present.
    pub async fn count(&self) -> Result<usize, LedgerError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Count { resp: tx })
            .await
            .map_err(|_| LedgerError::ChannelClosed)?;
        rx.await.map_err(|_| LedgerError::ChannelClosed)
    }

    /// Point-in-time copy of every record, oldest scan first.
    pub async fn export_all(&self) -> Result<Vec<AttendanceRecord>, LedgerError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Export { resp: tx })
            .await
            .map_err(|_| LedgerError::ChannelClosed)?;
        rx.await.map_err(|_| LedgerError::ChannelClosed)
    }

    /// Checkpoints the journal.
    pub async fn flush(&self) -> Result<(), LedgerError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Flush { resp: tx })
            .await
            .map_err(|_| LedgerError::ChannelClosed)?;
        rx.await.map_err(|_| LedgerError::ChannelClosed)?
    }

    /// Flushes and closes the journal; later calls fail with `ChannelClosed`.
    pub async fn shutdown(&self) -> Result<(), LedgerError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| LedgerError::ChannelClosed)?;
        rx.await.map_err(|_| LedgerError::ChannelClosed)?
    }
}

async fn handle_command(
    cmd: Command,
    store: &mut AttendanceStore,
    sink: Option<&SharedSink>,
    events_tx: &broadcast::Sender<LedgerEvent>,
) -> bool {
    match cmd {
        Command::MarkPresent {
            ticket,
            raw_qr,
            attendee_name,
            resp,
        } => {
            let res = mark_present(store, sink, ticket, raw_qr, attendee_name).await;
            if let Ok(outcome) = &res {
                let ticket = outcome.record.ticket_number.clone();
                let event = if outcome.created {
                    LedgerEvent::Marked { ticket }
                } else {
                    LedgerEvent::Duplicate { ticket }
                };
                let _ = events_tx.send(event);
            }
            let _ = resp.send(res);
        }
        Command::Get { ticket, resp } => {
            let _ = resp.send(store.get_cloned(&ticket));
        }
        Command::Count { resp } => {
            let _ = resp.send(store.len());
        }
        Command::Export { resp } => {
            let _ = resp.send(store.export_sorted());
        }
        Command::Flush { resp } => {
            let _ = resp.send(flush_sink(sink).await);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(flush_sink(sink).await);
            return true;
        }
    }

    false
}

async fn mark_present(
    store: &mut AttendanceStore,
    sink: Option<&SharedSink>,
    ticket: TicketId,
    raw_qr: String,
    attendee_name: String,
) -> Result<MarkOutcome, LedgerError> {
    let now = now_utc();
    let Some(sink) = sink else {
        return Ok(store.mark(ticket, &raw_qr, &attendee_name, now));
    };

    if let Some(existing) = store.duplicate_of(&ticket) {
        return Ok(existing);
    }
    let record = AttendanceRecord::new(ticket, attendee_name, now, raw_qr);

    // The index is only touched once the row is durable.
    let sink_ref = Arc::clone(sink);
    let pending = record.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut sink = sink_ref.blocking_lock();
        sink.insert_once(&pending)
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))??;

    match outcome {
        InsertOutcome::Inserted => {
            debug!(ticket = %record.ticket_number, "attendance recorded");
            store.insert(record.clone())?;
            Ok(MarkOutcome::created(record))
        }
        InsertOutcome::Existing(winner) => {
            debug!(ticket = %winner.ticket_number, "attendance row already on disk");
            store.insert(winner.clone())?;
            Ok(MarkOutcome::duplicate(winner))
        }
    }
}

async fn flush_sink(sink: Option<&SharedSink>) -> Result<(), LedgerError> {
    let Some(sink) = sink else {
        return Ok(());
    };
    let sink_ref = Arc::clone(sink);
    tokio::task::spawn_blocking(move || {
        let mut sink = sink_ref.blocking_lock();
        sink.flush()
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))??;
    Ok(())
}

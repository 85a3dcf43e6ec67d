use std::sync::Arc;

use tempfile::TempDir;
use tracing::Level;

use qrcheckin::{
    attendee::{AttendanceRecord, Registration},
    checkin::{CheckinService, ScanOutcome, ScanStage},
    codec::TicketCodec,
    core::store::AttendanceStore,
    persist::{
        AttendanceSink, InsertOutcome, PersistError, PersistResult, RegistrationLookup,
        registry::{InMemoryRegistry, SqliteRegistry},
    },
    runtime::handle::{RuntimeConfig, spawn_ledger, spawn_sqlite_ledger},
    types::TicketId,
};

fn reg(ticket: &str, first: &str, last: &str) -> Registration {
    Registration {
        ticket_number: TicketId::new(ticket),
        first_name: first.to_string(),
        last_name: last.to_string(),
    }
}

fn registrations() -> Vec<Registration> {
    vec![
        reg("GOOGA261700489", "Jane", "Doe"),
        reg("GOOGA261700490", "John", "Roe"),
        reg("GOOGA260000001", "Zed", ""),
    ]
}

fn in_memory_service() -> CheckinService {
    let registry: InMemoryRegistry = registrations().into_iter().collect();
    let ledger = spawn_ledger(AttendanceStore::new(), None, RuntimeConfig::default());
    CheckinService::new(TicketCodec::default(), Arc::new(registry), ledger)
}

struct BrokenRegistry;

impl RegistrationLookup for BrokenRegistry {
    fn find(&self, _ticket: &TicketId) -> PersistResult<Option<Registration>> {
        Err(PersistError::Message("registrations.db is corrupt".to_string()))
    }
}

struct ReadOnlyDisk;

impl AttendanceSink for ReadOnlyDisk {
    fn insert_once(&mut self, _record: &AttendanceRecord) -> PersistResult<InsertOutcome> {
        Err(PersistError::Message("attempt to write a readonly database".to_string()))
    }

    fn load_all(&self) -> PersistResult<Vec<AttendanceRecord>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn jane_doe_created_then_duplicate_with_same_time() {
    let service = in_memory_service();

    let first = service.scan("87189:1700489").await;
    let ScanOutcome::Created {
        ticket,
        attendee_name,
        scan_time,
        raw_qr,
    } = first.clone()
    else {
        panic!("expected Created, got {first:?}");
    };
    assert_eq!(ticket.as_str(), "GOOGA261700489");
    assert_eq!(attendee_name, "Jane Doe");
    assert_eq!(raw_qr, "87189:1700489");

    let second = service.scan("  87189:1700489\n").await;
    match second {
        ScanOutcome::Duplicate {
            scan_time: again,
            attendee_name,
            raw_qr,
            ..
        } => {
            assert_eq!(again, scan_time);
            assert_eq!(attendee_name, "Jane Doe");
            assert_eq!(raw_qr, "87189:1700489");
        }
        other => panic!("expected Duplicate, got {other:?}"),
    }

    service.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn payload_without_separator_is_rejected() {
    let service = in_memory_service();

    let outcome = service.scan("no-colon-here").await;
    assert_eq!(
        outcome,
        ScanOutcome::Rejected {
            raw_qr: "no-colon-here".to_string()
        }
    );
    assert_eq!(outcome.status(), "INVALID_FORMAT");
    assert_eq!(service.present_count().await.expect("count"), 0);
}

#[tokio::test]
async fn unregistered_ticket_is_not_found() {
    let service = in_memory_service();

    let outcome = service.scan("1:999999").await;
    assert_eq!(
        outcome,
        ScanOutcome::NotFound {
            ticket: TicketId::new("GOOGA26999999"),
            raw_qr: "1:999999".to_string(),
        }
    );
    assert_eq!(service.present_count().await.expect("count"), 0);
}

#[tokio::test]
async fn count_equals_distinct_successful_scans() {
    let service = in_memory_service();

    for raw in ["a:1700489", "b:1700490", "c:1700489", "d:0000001", "e:42", "f"] {
        service.scan(raw).await;
    }

    assert_eq!(service.present_count().await.expect("count"), 3);
    let exported = service.export().await.expect("export");
    assert_eq!(exported.len(), 3);
    assert!(exported.windows(2).all(|w| w[0].scan_time <= w[1].scan_time));
    assert_eq!(exported[2].attendee_name, "Zed");
}

#[tokio::test]
async fn lookup_failure_maps_to_failed_and_skips_ledger() {
    let ledger = spawn_ledger(AttendanceStore::new(), None, RuntimeConfig::default());
    let service = CheckinService::new(TicketCodec::default(), Arc::new(BrokenRegistry), ledger);

    let outcome = service.scan("87189:1700489").await;
    assert_eq!(
        outcome,
        ScanOutcome::Failed {
            stage: ScanStage::Lookup,
            ticket: TicketId::new("GOOGA261700489"),
            raw_qr: "87189:1700489".to_string(),
        }
    );
    assert_eq!(outcome.status(), "ERROR");
    assert_eq!(service.present_count().await.expect("count"), 0);
    assert!(service.attendee(TicketId::new("GOOGA261700489")).await.is_err());
}

#[tokio::test]
async fn ledger_failure_maps_to_failed() {
    let registry: InMemoryRegistry = registrations().into_iter().collect();
    let ledger = spawn_ledger(
        AttendanceStore::new(),
        Some(Box::new(ReadOnlyDisk)),
        RuntimeConfig::default(),
    );
    let service = CheckinService::new(TicketCodec::default(), Arc::new(registry), ledger);

    let outcome = service.scan("87189:1700489").await;
    assert!(matches!(
        outcome,
        ScanOutcome::Failed {
            stage: ScanStage::Attendance,
            ..
        }
    ));
}

#[tokio::test]
async fn sqlite_backed_service_end_to_end() {
    let tmp = TempDir::new().expect("tmp");
    let reg_path = tmp.path().join("registrations.db");
    let att_path = tmp.path().join("attendance.db");

    SqliteRegistry::import(&reg_path, registrations()).expect("import");
    let registry = SqliteRegistry::open(&reg_path).expect("open registry");
    let ledger = spawn_sqlite_ledger(&att_path, RuntimeConfig::default())
        .await
        .expect("ledger");
    let service = CheckinService::new(TicketCodec::default(), Arc::new(registry), ledger);

    assert!(matches!(
        service.scan("87189:1700489").await,
        ScanOutcome::Created { .. }
    ));
    assert!(matches!(
        service.scan("87189:1700489").await,
        ScanOutcome::Duplicate { .. }
    ));
    assert_eq!(
        service
            .attendee(TicketId::new("GOOGA261700490"))
            .await
            .expect("lookup")
            .map(|r| r.full_name()),
        Some("John Roe".to_string())
    );
    service.shutdown().await.expect("shutdown");
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn scan_logs_at(level: Level) -> String {
    let buf = LogBuffer::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");

    tracing::subscriber::with_default(subscriber, || {
        rt.block_on(async {
            let service = in_memory_service();
            service.scan("not-a-ticket").await;
            service.shutdown().await.expect("shutdown");
        })
    });

    let bytes = buf.0.lock().expect("log buffer").clone();
    String::from_utf8(bytes).expect("utf8")
}

#[test]
fn scan_payload_is_logged_only_at_debug() {
    assert!(!scan_logs_at(Level::INFO).contains("scan received"));

    let debug = scan_logs_at(Level::DEBUG);
    assert!(debug.contains("scan received"), "{debug}");
    assert!(debug.contains("not-a-ticket"), "{debug}");
}

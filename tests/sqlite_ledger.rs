use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use qrcheckin::{
    attendee::AttendanceRecord,
    persist::{AttendanceSink, InsertOutcome, sqlite::SqliteAttendanceSink},
    runtime::handle::{RuntimeConfig, spawn_sqlite_ledger},
    types::{ScanTime, TicketId},
};

fn at(secs: i64) -> ScanTime {
    Utc.with_ymd_and_hms(2025, 11, 20, 9, 0, 0).unwrap() + Duration::seconds(secs)
}

fn record(ticket: &str, secs: i64) -> AttendanceRecord {
    AttendanceRecord {
        ticket_number: TicketId::new(ticket),
        attendee_name: format!("Attendee {ticket}"),
        scan_time: at(secs),
        raw_qr: format!("1:{ticket}"),
    }
}

#[test]
fn unique_conflict_returns_winning_row() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("attendance.db");

    let mut desk_a = SqliteAttendanceSink::open(&db_path).expect("open a");
    let mut desk_b = SqliteAttendanceSink::open(&db_path).expect("open b");

    let winner = record("GOOGA261", 0);
    let loser = AttendanceRecord {
        scan_time: at(3),
        raw_qr: "late:1".to_string(),
        ..winner.clone()
    };

    assert_eq!(desk_a.insert_once(&winner).expect("insert"), InsertOutcome::Inserted);
    assert_eq!(
        desk_b.insert_once(&loser).expect("conflict"),
        InsertOutcome::Existing(winner.clone())
    );
    assert_eq!(desk_a.count().expect("count"), 1);
}

#[test]
fn reload_orders_by_scan_time() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("nested").join("attendance.db");

    let mut sink = SqliteAttendanceSink::open(&db_path).expect("open sqlite");
    for (ticket, secs) in [("B", 20), ("A", 5), ("C", 40)] {
        sink.insert_once(&record(ticket, secs)).expect("insert");
    }
    sink.flush().expect("flush");
    drop(sink);

    let reopened = SqliteAttendanceSink::open(&db_path).expect("reopen");
    let store = reopened.load_store().expect("replay");
    let order: Vec<_> = store
        .ordered_tickets()
        .iter()
        .map(|t| t.as_str().to_string())
        .collect();
    assert_eq!(order, vec!["A", "B", "C"]);
    assert_eq!(
        store.get(&TicketId::new("B")).cloned(),
        Some(record("B", 20))
    );
}

#[tokio::test]
async fn restarted_ledger_still_detects_duplicates() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("attendance.db");
    let ticket = TicketId::new("GOOGA261700489");

    let handle = spawn_sqlite_ledger(&db_path, RuntimeConfig::default())
        .await
        .expect("open ledger");
    let first = handle
        .mark_present(ticket.clone(), "87189:1700489", "Jane Doe")
        .await
        .expect("mark");
    assert!(first.created);
    handle.flush().await.expect("flush");
    handle.shutdown().await.expect("shutdown");

    let handle = spawn_sqlite_ledger(&db_path, RuntimeConfig::default())
        .await
        .expect("reopen ledger");
    assert_eq!(handle.count().await.expect("count"), 1);
    let again = handle
        .mark_present(ticket, "87189:1700489", "Jane Doe")
        .await
        .expect("mark again");
    assert!(!again.created);
    assert_eq!(again.record, first.record);
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn ledger_opens_over_offset_less_scan_times() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("attendance.db");
    drop(SqliteAttendanceSink::open(&db_path).expect("create schema"));

    let conn = rusqlite::Connection::open(&db_path).expect("raw connection");
    conn.execute(
        "INSERT INTO attendance_log (ticket_number, attendee_name, scan_time_utc, raw_qr)
         VALUES ('GOOGA261700489', 'Jane Doe', '2025-11-20T09:15:02.123456', '87189:1700489')",
        [],
    )
    .expect("legacy row");
    drop(conn);

    let handle = spawn_sqlite_ledger(&db_path, RuntimeConfig::default())
        .await
        .expect("open ledger");
    let again = handle
        .mark_present(TicketId::new("GOOGA261700489"), "87189:1700489", "Jane Doe")
        .await
        .expect("mark");
    assert!(!again.created);
    assert_eq!(
        again.record.scan_time,
        Utc.with_ymd_and_hms(2025, 11, 20, 9, 15, 2).unwrap() + Duration::microseconds(123_456)
    );
    handle.shutdown().await.expect("shutdown");
}

#[test]
fn unreadable_scan_time_names_the_ticket() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("attendance.db");
    let sink = SqliteAttendanceSink::open(&db_path).expect("open");

    let conn = rusqlite::Connection::open(&db_path).expect("raw connection");
    conn.execute(
        "INSERT INTO attendance_log (ticket_number, scan_time_utc) VALUES ('GOOGA267', 'soon')",
        [],
    )
    .expect("bad row");

    let err = sink.load_store().expect_err("corrupt row");
    assert!(err.to_string().contains("GOOGA267"), "{err}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_marks_write_one_row() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("attendance.db");
    let handle = spawn_sqlite_ledger(&db_path, RuntimeConfig::default())
        .await
        .expect("open ledger");
    let ticket = TicketId::new("GOOGA26900");

    let mut tasks = Vec::new();
    for i in 0..16 {
        let handle = handle.clone();
        let ticket = ticket.clone();
        tasks.push(tokio::spawn(async move {
            handle.mark_present(ticket, format!("{i}:900"), "Z").await
        }));
    }
    let mut created = 0;
    let mut times = Vec::new();
    for task in tasks {
        let outcome = task.await.expect("join").expect("mark");
        created += usize::from(outcome.created);
        times.push(outcome.record.scan_time);
    }
    handle.shutdown().await.expect("shutdown");

    assert_eq!(created, 1);
    assert!(times.windows(2).all(|w| w[0] == w[1]));
    let sink = SqliteAttendanceSink::open(&db_path).expect("reopen");
    assert_eq!(sink.count().expect("count"), 1);
}

//! Attendance CSV rendering.

use crate::{attendee::AttendanceRecord, types::format_scan_time};

/// Header row of the attendance export.
pub const EXPORT_HEADER: [&str; 4] = ["ticket_number", "attendee_name", "scan_time_utc", "raw_qr"];

const LINE_END: &str = "\r\n";

/// Renders `records` in the given order, quoting fields only when needed.
pub fn render_attendance_csv(records: &[AttendanceRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, EXPORT_HEADER);
    for rec in records {
        let scan_time = format_scan_time(&rec.scan_time);
        push_row(
            &mut out,
            [
                rec.ticket_number.as_str(),
                rec.attendee_name.as_str(),
                scan_time.as_str(),
                rec.raw_qr.as_str(),
            ],
        );
    }
    out
}

fn push_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push_str(LINE_END);
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

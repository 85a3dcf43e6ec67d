//! Check-in API handlers

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    attendee::Registration,
    checkin::{CheckinService, ScanOutcome, ScanStage},
    types::{TicketId, format_scan_time},
};

use super::{
    csv::render_attendance_csv,
    error::{AppError, AppResult},
};

// ============================================================================
// Request / Response Types
// ============================================================================

/// `POST /scan` body.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    /// Scanned payload; missing counts as empty.
    #[serde(default)]
    pub raw_qr: Option<String>,
}

/// Attendee shown on successful and duplicate scans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttendeeSummary {
    /// Display name.
    pub name: String,
}

/// Body of every `/scan` reply, whatever the outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    /// `OK`, `DUPLICATE`, `NOT_FOUND`, `INVALID_FORMAT` or `ERROR`.
    pub status: &'static str,
    /// Derived ticket; absent for `INVALID_FORMAT`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_number: Option<TicketId>,
    /// Present for `OK` and `DUPLICATE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendee: Option<AttendeeSummary>,
    /// Time of the first check-in, RFC3339 UTC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_scan_time_utc: Option<String>,
    /// Trimmed payload.
    pub raw_qr: String,
    /// `lookup_failed` or `attendance_failed` for `ERROR`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl From<ScanOutcome> for ScanResponse {
    fn from(outcome: ScanOutcome) -> Self {
        let status = outcome.status();
        let mut resp = ScanResponse {
            status,
            ticket_number: outcome.ticket().cloned(),
            attendee: None,
            first_scan_time_utc: None,
            raw_qr: outcome.raw_qr().to_string(),
            error: None,
        };
        match outcome {
            ScanOutcome::Created {
                attendee_name,
                scan_time,
                ..
            }
            | ScanOutcome::Duplicate {
                attendee_name,
                scan_time,
                ..
            } => {
                resp.attendee = Some(AttendeeSummary {
                    name: attendee_name,
                });
                resp.first_scan_time_utc = Some(format_scan_time(&scan_time));
            }
            ScanOutcome::Failed { stage, .. } => {
                resp.error = Some(match stage {
                    ScanStage::Lookup => "lookup_failed",
                    ScanStage::Attendance => "attendance_failed",
                });
            }
            ScanOutcome::Rejected { .. } | ScanOutcome::NotFound { .. } => {}
        }
        resp
    }
}

/// `GET /stats` body.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Distinct tickets checked in.
    pub present_count: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /ping
pub async fn ping() -> Json<Value> {
    Json(json!({ "msg": "pong" }))
}

/// POST /scan - always answers 200 with a classified outcome
///
/// An unreadable body is scanned as an empty payload, so it is reported as
/// `INVALID_FORMAT`.
pub async fn scan(
    State(service): State<CheckinService>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Json<ScanResponse> {
    let raw = match payload {
        Ok(Json(req)) => req.raw_qr.unwrap_or_default(),
        Err(rejection) => {
            debug!(error = %rejection, "unreadable scan body");
            String::new()
        }
    };
    let outcome = service.scan(&raw).await;
    Json(ScanResponse::from(outcome))
}

/// GET /attendee/{ticket}
pub async fn attendee(
    State(service): State<CheckinService>,
    Path(ticket): Path<String>,
) -> AppResult<Json<Registration>> {
    service
        .attendee(TicketId::new(ticket))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))
}

/// GET /stats
pub async fn stats(State(service): State<CheckinService>) -> AppResult<Json<StatsResponse>> {
    let present_count = service.present_count().await?;
    Ok(Json(StatsResponse { present_count }))
}

/// GET /attendance/export - CSV download ordered by scan time
pub async fn export(State(service): State<CheckinService>) -> AppResult<Response> {
    let records = service.export().await?;
    let body = render_attendance_csv(&records);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=attendance_export.csv",
            ),
        ],
        body,
    )
        .into_response())
}

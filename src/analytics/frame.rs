use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::store::{AttendanceStore, StoreResult};

/// One row of the working table. Only records with an entry time become rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRow {
    pub employee_id: String,
    pub date: NaiveDate,
    pub entry_time: NaiveDateTime,
    pub exit_time: Option<NaiveDateTime>,
    pub duration: f64,
    pub status: AttendanceStatus,
}

impl AttendanceRow {
    pub fn from_record(record: Attendance) -> Option<Self> {
        let entry_time = record.entry_time?;
        let status = record.attendance_status();
        Some(Self {
            employee_id: record.employee_id,
            date: record.date,
            entry_time,
            exit_time: record.exit_time,
            duration: record.duration.unwrap_or(0.0),
            status,
        })
    }

    pub fn login_hour(&self) -> u32 {
        self.entry_time.hour()
    }

    /// Weekday of the row's date, derived alongside the login hour. None of
    /// the current metrics or rules read it.
    pub fn day_of_week(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn is_absent(&self) -> bool {
        self.status == AttendanceStatus::Absent
    }
}

/// Working table built per call and owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttendanceFrame {
    rows: Vec<AttendanceRow>,
}

impl AttendanceFrame {
    pub fn from_records(records: impl IntoIterator<Item = Attendance>) -> Self {
        Self {
            rows: records
                .into_iter()
                .filter_map(AttendanceRow::from_record)
                .collect(),
        }
    }

    pub fn rows(&self) -> &[AttendanceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn durations(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.duration).collect()
    }

    pub fn login_hours(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.login_hour() as f64).collect()
    }
}

/// Build the working table for one employee, or for every non-admin employee
/// when `employee_id` is `None` or empty.
///
/// A requested employee is loaded even if they are an admin. Records without
/// an entry time are dropped.
#[instrument(name = "load_attendance_frame", skip(store))]
pub async fn load_attendance_frame(
    store: &dyn AttendanceStore,
    employee_id: Option<&str>,
) -> StoreResult<AttendanceFrame> {
    let admin_ids = store.admin_employee_ids().await?;
    debug!(admins = admin_ids.len(), "Resolved admin employees");

    let records = match employee_id.filter(|id| !id.is_empty()) {
        Some(id) => store.attendance_for_employee(id).await?,
        None => store.attendance_excluding(&admin_ids).await?,
    };

    let fetched = records.len();
    let frame = AttendanceFrame::from_records(records);
    info!(fetched, rows = frame.len(), "Attendance frame loaded");

    Ok(frame)
}

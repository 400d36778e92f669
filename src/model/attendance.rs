use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub employee_id: String,
    pub date: NaiveDate,
    pub entry_time: Option<NaiveDateTime>,
    pub exit_time: Option<NaiveDateTime>,
    /// Worked hours, NULL until the record is closed
    pub duration: Option<f64>,
    pub status: String,
}

impl Attendance {
    pub fn attendance_status(&self) -> AttendanceStatus {
        self.status.parse().unwrap_or(AttendanceStatus::Unknown)
    }
}

/// Status values as stored in `attendance.status`. Matching is case-sensitive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    HalfDay,
    OnLeave,
    Unknown,
}

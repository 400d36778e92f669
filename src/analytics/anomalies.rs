use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::analytics::frame::AttendanceFrame;
use crate::analytics::metrics::month_start;
use crate::analytics::stats::{mean, median, sample_std};
use crate::store::{AttendanceStore, DateRange, StoreResult};

const Z_SCORE_LIMIT: f64 = 2.0;
/// Late-arrival rule needs strictly more rows than this.
const LATE_RULE_MIN_ROWS: usize = 5;
const LATE_HOURS_OVER_MEDIAN: f64 = 2.0;
const BASELINE_WINDOW_DAYS: i64 = 90;
const SPIKE_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    UnusualHours,
    LateArrival,
    AbsenceSpike,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnomalyValue {
    Integer(i64),
    Hours(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub employee_id: String,
    /// ISO-8601 calendar date
    pub date: String,
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub value: AnomalyValue,
    pub reason: String,
}

fn unusual_hours(frame: &AttendanceFrame) -> Vec<Anomaly> {
    let durations = frame.durations();
    let (Some(mean), Some(std)) = (mean(&durations), sample_std(&durations)) else {
        return Vec::new();
    };
    if std <= 0.0 {
        return Vec::new();
    }

    frame
        .rows()
        .iter()
        .filter(|row| ((row.duration - mean) / std).abs() > Z_SCORE_LIMIT)
        .map(|row| {
            let length = if row.duration < 1.0 { "short" } else { "long" };
            Anomaly {
                employee_id: row.employee_id.clone(),
                date: row.date.to_string(),
                kind: AnomalyKind::UnusualHours,
                value: AnomalyValue::Hours(row.duration),
                reason: format!(
                    "⚠ Very {} work hours: {:.2}h (unusual)",
                    length, row.duration
                ),
            }
        })
        .collect()
}

fn late_arrivals(frame: &AttendanceFrame) -> Vec<Anomaly> {
    if frame.len() <= LATE_RULE_MIN_ROWS {
        return Vec::new();
    }
    let Some(usual) = median(&frame.login_hours()) else {
        return Vec::new();
    };
    let threshold = usual + LATE_HOURS_OVER_MEDIAN;

    frame
        .rows()
        .iter()
        .filter(|row| row.login_hour() as f64 > threshold)
        .map(|row| Anomaly {
            employee_id: row.employee_id.clone(),
            date: row.date.to_string(),
            kind: AnomalyKind::LateArrival,
            value: AnomalyValue::Integer(row.login_hour() as i64),
            reason: format!(
                "⚠ Late arrival at {}:00 (usually ~{}:00)",
                row.login_hour(),
                usual.trunc() as i64
            ),
        })
        .collect()
}

async fn absence_spike(
    store: &dyn AttendanceStore,
    employee_id: &str,
    today: NaiveDate,
) -> StoreResult<Option<Anomaly>> {
    let current = month_start(today);
    let this_month = store
        .count_absences(employee_id, DateRange::from(current))
        .await?;

    let window = DateRange::between(current - Duration::days(BASELINE_WINDOW_DAYS), current);
    let baseline = store
        .average_absence_count(employee_id, window)
        .await?
        .unwrap_or(0.0);
    debug!(this_month, baseline, "Absence baseline resolved");

    if (this_month as f64) <= baseline * SPIKE_FACTOR {
        return Ok(None);
    }

    Ok(Some(Anomaly {
        employee_id: employee_id.to_string(),
        date: today.to_string(),
        kind: AnomalyKind::AbsenceSpike,
        value: AnomalyValue::Integer(this_month),
        reason: format!(
            "⚠ Sudden absence spike: {} absences this month (avg was {})",
            this_month,
            baseline.trunc() as i64
        ),
    }))
}

/// Flag unusual rows in `frame`, dated today (UTC).
pub async fn detect_attendance_anomalies(
    frame: &AttendanceFrame,
    store: Option<&dyn AttendanceStore>,
    employee_id: Option<&str>,
) -> StoreResult<Vec<Anomaly>> {
    detect_attendance_anomalies_on(frame, store, employee_id, Utc::now().date_naive()).await
}

/// Runs three independent rules:
///
/// * durations whose sample z-score exceeds 2 in magnitude;
/// * login hours more than two hours past the median, on tables of six rows
///   or more;
/// * with a store and an employee id, this month's absences against 1.5x the
///   absence count of the preceding 90 days.
///
/// The returned list has no meaningful order.
#[instrument(name = "detect_attendance_anomalies", skip(frame, store), fields(rows = frame.len()))]
pub async fn detect_attendance_anomalies_on(
    frame: &AttendanceFrame,
    store: Option<&dyn AttendanceStore>,
    employee_id: Option<&str>,
    today: NaiveDate,
) -> StoreResult<Vec<Anomaly>> {
    if frame.is_empty() {
        return Ok(Vec::new());
    }

    let mut anomalies = unusual_hours(frame);
    anomalies.extend(late_arrivals(frame));

    if let (Some(store), Some(employee_id)) = (store, employee_id.filter(|id| !id.is_empty())) {
        anomalies.extend(absence_spike(store, employee_id, today).await?);
    }

    info!(anomalies = anomalies.len(), "Anomaly detection finished");
    Ok(anomalies)
}

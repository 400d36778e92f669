use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use tracing::{debug, info, instrument};

use crate::analytics::frame::AttendanceFrame;
use crate::analytics::stats::{max, mean, min, round2};
use crate::model::department::{DepartmentComparison, DepartmentStats};
use crate::store::{AttendanceStore, DateRange, StoreResult};

/// Login hours strictly above this count as late.
pub const LATE_LOGIN_HOUR: u32 = 10;

const TREND_RISE_FACTOR: f64 = 1.2;
const TREND_FALL_FACTOR: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AbsenceTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl AbsenceTrend {
    pub fn compare(this_month: i64, last_month: i64) -> Self {
        if last_month == 0 {
            return if this_month == 0 {
                AbsenceTrend::Stable
            } else {
                AbsenceTrend::Increasing
            };
        }

        let (this_month, last_month) = (this_month as f64, last_month as f64);
        if this_month > last_month * TREND_RISE_FACTOR {
            AbsenceTrend::Increasing
        } else if this_month < last_month * TREND_FALL_FACTOR {
            AbsenceTrend::Decreasing
        } else {
            AbsenceTrend::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorMetrics {
    pub average_login_hour: f64,
    pub late_arrival_days: i64,
    pub absent_days: i64,
    pub average_work_hours: f64,
    pub total_days_analyzed: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_work_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_work_hours: Option<f64>,
    /// Only computed for a single employee with a store, or on an empty table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absence_trend: Option<AbsenceTrend>,
    /// Absent unless the org-wide comparison ran; `null` on an empty table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_comparison: Option<Option<Vec<DepartmentComparison>>>,
}

impl BehaviorMetrics {
    pub fn empty() -> Self {
        Self {
            average_login_hour: 0.0,
            late_arrival_days: 0,
            absent_days: 0,
            average_work_hours: 0.0,
            total_days_analyzed: 0,
            min_work_hours: None,
            max_work_hours: None,
            absence_trend: Some(AbsenceTrend::Stable),
            department_comparison: Some(None),
        }
    }
}

pub fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

pub fn previous_month_start(current_month_start: NaiveDate) -> NaiveDate {
    month_start(current_month_start - Duration::days(1))
}

impl From<DepartmentStats> for DepartmentComparison {
    fn from(stats: DepartmentStats) -> Self {
        Self {
            department: stats.department.unwrap_or_else(|| "Unknown".to_string()),
            employees: stats.emp_count,
            avg_work_hours: round2(stats.avg_duration.unwrap_or(0.0)),
        }
    }
}

/// Summary metrics over `frame`, dated today (UTC).
pub async fn compute_behavior_metrics(
    frame: &AttendanceFrame,
    store: Option<&dyn AttendanceStore>,
    employee_id: Option<&str>,
) -> StoreResult<BehaviorMetrics> {
    compute_behavior_metrics_on(frame, store, employee_id, Utc::now().date_naive()).await
}

/// Summary metrics over `frame` with an explicit "today".
///
/// With a store and an employee id the month-over-month absence trend is
/// filled in; with a store and no employee id the per-department comparison
/// is.
#[instrument(name = "compute_behavior_metrics", skip(frame, store), fields(rows = frame.len()))]
pub async fn compute_behavior_metrics_on(
    frame: &AttendanceFrame,
    store: Option<&dyn AttendanceStore>,
    employee_id: Option<&str>,
    today: NaiveDate,
) -> StoreResult<BehaviorMetrics> {
    if frame.is_empty() {
        debug!("Empty attendance frame, returning zero metrics");
        return Ok(BehaviorMetrics::empty());
    }

    let login_hours = frame.login_hours();
    let durations = frame.durations();
    let rows = frame.rows();

    let mut metrics = BehaviorMetrics {
        average_login_hour: round2(mean(&login_hours).unwrap_or(0.0)),
        late_arrival_days: rows
            .iter()
            .filter(|r| r.login_hour() > LATE_LOGIN_HOUR)
            .count() as i64,
        absent_days: rows.iter().filter(|r| r.is_absent()).count() as i64,
        average_work_hours: round2(mean(&durations).unwrap_or(0.0)),
        total_days_analyzed: rows.len() as i64,
        min_work_hours: min(&durations).map(round2),
        max_work_hours: max(&durations).map(round2),
        absence_trend: None,
        department_comparison: None,
    };

    let employee_id = employee_id.filter(|id| !id.is_empty());

    if let (Some(store), Some(employee_id)) = (store, employee_id) {
        let current = month_start(today);
        let previous = previous_month_start(current);

        let this_month = store
            .count_absences(employee_id, DateRange::from(current))
            .await?;
        let last_month = store
            .count_absences(employee_id, DateRange::between(previous, current))
            .await?;

        let trend = AbsenceTrend::compare(this_month, last_month);
        debug!(this_month, last_month, trend = %trend, "Absence trend computed");
        metrics.absence_trend = Some(trend);
    }

    if let (Some(store), None) = (store, employee_id) {
        let departments: Vec<DepartmentComparison> = store
            .department_stats()
            .await?
            .into_iter()
            .map(DepartmentComparison::from)
            .collect();
        debug!(departments = departments.len(), "Department comparison computed");
        metrics.department_comparison = Some(Some(departments));
    }

    info!(
        total_days = metrics.total_days_analyzed,
        late = metrics.late_arrival_days,
        absent = metrics.absent_days,
        "Behavior metrics computed"
    );

    Ok(metrics)
}

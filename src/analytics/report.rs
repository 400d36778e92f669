use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use crate::analytics::anomalies::{Anomaly, detect_attendance_anomalies_on};
use crate::analytics::frame::load_attendance_frame;
use crate::analytics::metrics::{BehaviorMetrics, compute_behavior_metrics_on};
use crate::analytics::roster::get_employee_list;
use crate::model::user::User;
use crate::store::{AttendanceStore, EmployeeFilter, StoreResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportScope {
    /// `None` analyses every non-admin employee
    pub employee_id: Option<String>,
    pub roster: EmployeeFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceReport {
    pub generated_on: NaiveDate,
    pub scope: ReportScope,
    pub metrics: BehaviorMetrics,
    pub anomalies: Vec<Anomaly>,
    pub employees: Vec<User>,
}

pub async fn build_attendance_report(
    store: &dyn AttendanceStore,
    scope: ReportScope,
) -> StoreResult<AttendanceReport> {
    build_attendance_report_on(store, scope, Utc::now().date_naive()).await
}

/// Load once, then run metrics, anomaly detection and the roster for `scope`.
#[instrument(name = "build_attendance_report", skip(store))]
pub async fn build_attendance_report_on(
    store: &dyn AttendanceStore,
    scope: ReportScope,
    today: NaiveDate,
) -> StoreResult<AttendanceReport> {
    let employee_id = scope.employee_id.as_deref();

    let frame = load_attendance_frame(store, employee_id).await?;
    let metrics = compute_behavior_metrics_on(&frame, Some(store), employee_id, today).await?;
    let anomalies = detect_attendance_anomalies_on(&frame, Some(store), employee_id, today).await?;
    let employees = get_employee_list(store, &scope.roster).await?;

    info!(
        rows = frame.len(),
        anomalies = anomalies.len(),
        employees = employees.len(),
        "Attendance report built"
    );

    Ok(AttendanceReport {
        generated_on: today,
        scope,
        metrics,
        anomalies,
        employees,
    })
}

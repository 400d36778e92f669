//! End-to-end checks of the analytics against the in-memory store.
//!
//! Run with: cargo test --test attendance_analytics

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use hrm_analytics::analytics::anomalies::detect_attendance_anomalies_on;
use hrm_analytics::analytics::metrics::compute_behavior_metrics_on;
use hrm_analytics::analytics::report::build_attendance_report_on;
use hrm_analytics::analytics::{
    AbsenceTrend, AnomalyKind, AnomalyValue, AttendanceFrame, ReportScope,
    compute_behavior_metrics, detect_attendance_anomalies, get_employee_list,
    load_attendance_frame,
};
use hrm_analytics::model::attendance::Attendance;
use hrm_analytics::model::user::User;
use hrm_analytics::store::{AttendanceStore, EmployeeFilter, MemoryStore};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2026, 3, 20)
}

fn user(id: &str, name: &str, department: Option<&str>, role: &str, active: bool) -> User {
    User {
        employee_id: id.to_string(),
        name: name.to_string(),
        department: department.map(str::to_string),
        role: role.to_string(),
        is_active: active,
    }
}

fn present(id: &str, day: NaiveDate, hour: u32, duration: Option<f64>) -> Attendance {
    Attendance {
        employee_id: id.to_string(),
        date: day,
        entry_time: Some(NaiveDateTime::new(
            day,
            NaiveTime::from_hms_opt(hour, 30, 0).unwrap(),
        )),
        exit_time: duration.map(|hours| {
            NaiveDateTime::new(day, NaiveTime::from_hms_opt(hour, 30, 0).unwrap())
                + chrono::Duration::minutes((hours * 60.0) as i64)
        }),
        duration,
        status: "PRESENT".to_string(),
    }
}

fn absent(id: &str, day: NaiveDate) -> Attendance {
    Attendance {
        employee_id: id.to_string(),
        date: day,
        entry_time: None,
        exit_time: None,
        duration: None,
        status: "ABSENT".to_string(),
    }
}

/// Rows on consecutive days of January 2026, one per (login hour, duration).
fn january(id: &str, rows: &[(u32, f64)]) -> Vec<Attendance> {
    rows.iter()
        .enumerate()
        .map(|(i, (hour, duration))| present(id, date(2026, 1, 1 + i as u32), *hour, Some(*duration)))
        .collect()
}

fn as_store(store: &MemoryStore) -> &dyn AttendanceStore {
    store
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

#[tokio::test]
async fn loader_drops_rows_without_entry_time() {
    let mut store = MemoryStore::default();
    store
        .add_user(user("E1", "Ada", Some("Engineering"), "employee", true))
        .add_attendance(present("E1", date(2026, 1, 5), 9, Some(8.0)))
        .add_attendance(absent("E1", date(2026, 1, 6)))
        .add_attendance(present("E1", date(2026, 1, 7), 9, None));

    let frame = load_attendance_frame(&store, Some("E1")).await.unwrap();

    assert_eq!(frame.len(), 2);
    assert!(frame.rows().iter().all(|r| r.date != date(2026, 1, 6)));
    assert_eq!(frame.rows()[1].duration, 0.0);
}

#[tokio::test]
async fn org_wide_loader_never_includes_admins() {
    let mut store = MemoryStore::default();
    store
        .add_user(user("A1", "Root", Some("IT"), "admin", true))
        .add_user(user("E1", "Ada", Some("Engineering"), "employee", true))
        .add_user(user("E2", "Bo", Some("Finance"), "hr", true))
        .add_attendance(present("A1", date(2026, 1, 5), 8, Some(9.0)))
        .add_attendance(present("E1", date(2026, 1, 5), 9, Some(8.0)))
        .add_attendance(present("E2", date(2026, 1, 5), 9, Some(7.5)));

    let frame = load_attendance_frame(&store, None).await.unwrap();
    assert_eq!(frame.len(), 2);
    assert!(frame.rows().iter().all(|r| r.employee_id != "A1"));

    // Empty id behaves like no id
    let blank = load_attendance_frame(&store, Some("")).await.unwrap();
    assert_eq!(blank, frame);
}

#[tokio::test]
async fn explicitly_requested_admin_is_loaded() {
    let mut store = MemoryStore::default();
    store
        .add_user(user("A1", "Root", Some("IT"), "admin", true))
        .add_attendance(present("A1", date(2026, 1, 5), 8, Some(9.0)));

    let frame = load_attendance_frame(&store, Some("A1")).await.unwrap();
    assert_eq!(frame.len(), 1);
    assert_eq!(frame.rows()[0].employee_id, "A1");
}

// ---------------------------------------------------------------------------
// Behavior metrics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_frame_yields_zero_metrics_and_no_anomalies() {
    let store = MemoryStore::default();
    let frame = load_attendance_frame(&store, None).await.unwrap();
    assert!(frame.is_empty());

    let metrics = compute_behavior_metrics(&frame, Some(as_store(&store)), None)
        .await
        .unwrap();
    assert_eq!(metrics.total_days_analyzed, 0);
    assert_eq!(metrics.average_login_hour, 0.0);
    assert_eq!(metrics.absence_trend, Some(AbsenceTrend::Stable));
    assert_eq!(metrics.department_comparison, Some(None));

    let anomalies = detect_attendance_anomalies(&frame, Some(as_store(&store)), Some("E1"))
        .await
        .unwrap();
    assert!(anomalies.is_empty());
}

#[tokio::test]
async fn summary_statistics_without_store() {
    let frame = AttendanceFrame::from_records(january(
        "E1",
        &[(9, 8.0), (10, 7.5), (11, 6.25), (12, 9.0)],
    ));

    let metrics = compute_behavior_metrics(&frame, None, Some("E1"))
        .await
        .unwrap();

    assert_eq!(metrics.average_login_hour, 10.5);
    // hour 10 is not late
    assert_eq!(metrics.late_arrival_days, 2);
    assert_eq!(metrics.absent_days, 0);
    assert_eq!(metrics.average_work_hours, 7.69);
    assert_eq!(metrics.min_work_hours, Some(6.25));
    assert_eq!(metrics.max_work_hours, Some(9.0));
    assert_eq!(metrics.total_days_analyzed, 4);
    assert_eq!(metrics.absence_trend, None);
    assert_eq!(metrics.department_comparison, None);
}

#[tokio::test]
async fn absent_rows_with_entry_time_are_counted() {
    let mut records = january("E1", &[(9, 8.0), (9, 8.0)]);
    let mut late_absent = present("E1", date(2026, 1, 3), 13, Some(0.0));
    late_absent.status = "ABSENT".to_string();
    records.push(late_absent);

    let frame = AttendanceFrame::from_records(records);
    let metrics = compute_behavior_metrics(&frame, None, None).await.unwrap();

    assert_eq!(metrics.absent_days, 1);
    assert_eq!(metrics.late_arrival_days, 1);
}

#[tokio::test]
async fn absence_trend_is_stable_with_no_absences_either_month() {
    let mut store = MemoryStore::default();
    store
        .add_user(user("E1", "Ada", Some("Engineering"), "employee", true))
        .add_attendance(present("E1", date(2026, 3, 2), 9, Some(8.0)));

    let frame = load_attendance_frame(&store, Some("E1")).await.unwrap();
    let metrics = compute_behavior_metrics_on(&frame, Some(as_store(&store)), Some("E1"), today())
        .await
        .unwrap();

    assert_eq!(metrics.absence_trend, Some(AbsenceTrend::Stable));
    assert_eq!(metrics.department_comparison, None);

    let json = serde_json::to_value(&metrics).unwrap();
    assert_eq!(json["absence_trend"], "stable");
    assert!(json.get("department_comparison").is_none());
}

#[tokio::test]
async fn average_login_hour_rounds_ties_to_even() {
    let mut rows = vec![(9, 8.0); 7];
    rows.push((10, 8.0));
    let frame = AttendanceFrame::from_records(january("E1", &rows));

    let metrics = compute_behavior_metrics(&frame, None, Some("E1"))
        .await
        .unwrap();

    // 73 / 8 = 9.125
    assert_eq!(metrics.average_login_hour, 9.12);
    assert_eq!(metrics.late_arrival_days, 1);
}

#[tokio::test]
async fn absence_trend_increases_from_an_empty_last_month() {
    let mut store = MemoryStore::default();
    store
        .add_user(user("E1", "Ada", Some("Engineering"), "employee", true))
        .add_attendance(present("E1", date(2026, 3, 2), 9, Some(8.0)))
        .add_attendance(absent("E1", date(2026, 3, 3)))
        .add_attendance(absent("E1", date(2026, 3, 4)))
        .add_attendance(absent("E1", date(2026, 3, 5)))
        // January is outside the comparison window
        .add_attendance(absent("E1", date(2026, 1, 15)));

    let frame = load_attendance_frame(&store, Some("E1")).await.unwrap();
    let metrics = compute_behavior_metrics_on(&frame, Some(as_store(&store)), Some("E1"), today())
        .await
        .unwrap();

    assert_eq!(metrics.absence_trend, Some(AbsenceTrend::Increasing));
}

#[tokio::test]
async fn absence_trend_decreases_against_last_month() {
    let mut store = MemoryStore::default();
    store.add_attendance(present("E1", date(2026, 3, 2), 9, Some(8.0)));
    for day in 2..=6 {
        store.add_attendance(absent("E1", date(2026, 2, day)));
    }
    store.add_attendance(absent("E1", date(2026, 3, 3)));

    let frame = load_attendance_frame(&store, Some("E1")).await.unwrap();
    let metrics = compute_behavior_metrics_on(&frame, Some(as_store(&store)), Some("E1"), today())
        .await
        .unwrap();

    assert_eq!(metrics.absence_trend, Some(AbsenceTrend::Decreasing));
}

#[tokio::test]
async fn department_comparison_covers_active_non_admins_only() {
    let mut store = MemoryStore::default();
    store
        .add_user(user("E1", "Ada", Some("Engineering"), "employee", true))
        .add_user(user("E2", "Bo", Some("Engineering"), "employee", true))
        .add_user(user("E3", "Cy", None, "employee", true))
        .add_user(user("E4", "Di", Some("Engineering"), "employee", false))
        .add_user(user("E5", "Ed", Some("Legal"), "employee", true))
        .add_user(user("A1", "Root", Some("Engineering"), "admin", true))
        .add_attendance(present("E1", date(2026, 1, 5), 9, Some(8.0)))
        .add_attendance(present("E1", date(2026, 1, 6), 9, Some(6.0)))
        .add_attendance(present("E2", date(2026, 1, 5), 9, Some(7.0)))
        .add_attendance(absent("E2", date(2026, 1, 6)))
        .add_attendance(present("E3", date(2026, 1, 5), 9, Some(5.125)))
        .add_attendance(present("E4", date(2026, 1, 5), 9, Some(20.0)))
        .add_attendance(present("A1", date(2026, 1, 5), 9, Some(20.0)));

    let frame = load_attendance_frame(&store, None).await.unwrap();
    let metrics = compute_behavior_metrics(&frame, Some(as_store(&store)), None)
        .await
        .unwrap();

    assert_eq!(metrics.absence_trend, None);
    let departments = metrics
        .department_comparison
        .flatten()
        .expect("org-wide comparison");
    assert_eq!(departments.len(), 2);

    let engineering = departments
        .iter()
        .find(|d| d.department == "Engineering")
        .unwrap();
    assert_eq!(engineering.employees, 2);
    // NULL duration on the absent row is ignored by the average
    assert_eq!(engineering.avg_work_hours, 7.0);

    let unknown = departments.iter().find(|d| d.department == "Unknown").unwrap();
    assert_eq!(unknown.employees, 1);
    assert_eq!(unknown.avg_work_hours, 5.12);

    assert!(departments.iter().all(|d| d.department != "Legal"));
}

// ---------------------------------------------------------------------------
// Anomaly detection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn long_duration_spike_is_flagged() {
    let mut rows = vec![(9, 8.0); 9];
    rows.push((9, 40.0));
    let frame = AttendanceFrame::from_records(january("E1", &rows));

    let anomalies = detect_attendance_anomalies(&frame, None, None).await.unwrap();

    assert_eq!(anomalies.len(), 1);
    let spike = &anomalies[0];
    assert_eq!(spike.kind, AnomalyKind::UnusualHours);
    assert_eq!(spike.date, "2026-01-10");
    assert_eq!(spike.value, AnomalyValue::Hours(40.0));
    assert!(spike.reason.to_lowercase().contains("very long"));
    assert!(spike.reason.contains("40.00h"));
}

#[tokio::test]
async fn five_rows_cannot_reach_a_sample_z_score_of_two() {
    let frame = AttendanceFrame::from_records(january(
        "E1",
        &[(9, 8.0), (9, 8.0), (9, 8.0), (9, 8.0), (9, 40.0)],
    ));

    let anomalies = detect_attendance_anomalies(&frame, None, None).await.unwrap();
    assert!(anomalies.is_empty());
}

#[tokio::test]
async fn late_arrival_beyond_median_plus_two() {
    let frame = AttendanceFrame::from_records(january(
        "E1",
        &[(9, 8.0), (9, 8.0), (9, 8.0), (9, 8.0), (9, 8.0), (14, 8.0)],
    ));

    let anomalies = detect_attendance_anomalies(&frame, None, None).await.unwrap();

    assert_eq!(anomalies.len(), 1);
    let late = &anomalies[0];
    assert_eq!(late.kind, AnomalyKind::LateArrival);
    assert_eq!(late.value, AnomalyValue::Integer(14));
    assert_eq!(late.date, "2026-01-06");
    assert!(late.reason.contains("14:00"));
    assert!(late.reason.contains("usually ~9:00"));
}

#[tokio::test]
async fn late_arrival_rule_is_skipped_on_five_rows() {
    let frame = AttendanceFrame::from_records(january(
        "E1",
        &[(9, 8.0), (9, 8.0), (9, 8.0), (9, 8.0), (14, 8.0)],
    ));

    let anomalies = detect_attendance_anomalies(&frame, None, None).await.unwrap();
    assert!(anomalies.is_empty());
}

fn spike_store(this_month: u32, baseline: u32) -> MemoryStore {
    let mut store = MemoryStore::default();
    store
        .add_user(user("E1", "Ada", Some("Engineering"), "employee", true))
        .add_attendance(present("E1", date(2026, 3, 18), 9, Some(8.0)));
    for day in 1..=this_month {
        store.add_attendance(absent("E1", date(2026, 3, day)));
    }
    for day in 1..=baseline {
        store.add_attendance(absent("E1", date(2026, 2, day)));
    }
    // Older than 90 days before March 1st
    store.add_attendance(absent("E1", date(2025, 11, 20)));
    store
}

#[tokio::test]
async fn absence_spike_over_one_and_a_half_times_baseline() {
    let store = spike_store(8, 5);
    let frame = load_attendance_frame(&store, Some("E1")).await.unwrap();

    let anomalies = detect_attendance_anomalies_on(&frame, Some(as_store(&store)), Some("E1"), today())
        .await
        .unwrap();

    assert_eq!(anomalies.len(), 1);
    let spike = &anomalies[0];
    assert_eq!(spike.kind, AnomalyKind::AbsenceSpike);
    assert_eq!(spike.employee_id, "E1");
    assert_eq!(spike.date, "2026-03-20");
    assert_eq!(spike.value, AnomalyValue::Integer(8));
    assert!(spike.reason.contains("8 absences"));
    assert!(spike.reason.contains("avg was 5"));
}

#[tokio::test]
async fn no_absence_spike_at_or_below_threshold() {
    let store = spike_store(7, 5);
    let frame = load_attendance_frame(&store, Some("E1")).await.unwrap();

    let anomalies = detect_attendance_anomalies_on(&frame, Some(as_store(&store)), Some("E1"), today())
        .await
        .unwrap();
    assert!(anomalies.is_empty());
}

#[tokio::test]
async fn absence_spike_needs_an_employee_id() {
    let store = spike_store(8, 0);
    let frame = load_attendance_frame(&store, None).await.unwrap();

    let anomalies = detect_attendance_anomalies_on(&frame, Some(as_store(&store)), None, today())
        .await
        .unwrap();
    assert!(anomalies.is_empty());
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

fn roster_store() -> MemoryStore {
    MemoryStore::new(
        vec![
            user("E3", "Zoe", Some("Finance"), "employee", true),
            user("E1", "Ada", Some("Engineering"), "employee", true),
            user("A1", "Mia", Some("Engineering"), "admin", true),
            user("E2", "Bo", Some("Engineering"), "hr", true),
            user("E4", "Cal", Some("Engineering"), "employee", false),
        ],
        Vec::new(),
    )
}

#[tokio::test]
async fn roster_lists_active_non_admins_by_name() {
    let store = roster_store();
    let users = get_employee_list(&store, &EmployeeFilter::default())
        .await
        .unwrap();

    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Ada", "Bo", "Zoe"]);
}

#[tokio::test]
async fn roster_filters_department_and_can_include_admins() {
    let store = roster_store();
    let filter = EmployeeFilter {
        department: Some("Engineering".to_string()),
        exclude_admins: false,
    };
    let users = get_employee_list(&store, &filter).await.unwrap();

    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Ada", "Bo", "Mia"]);
}

#[tokio::test]
async fn roster_matches_roles_and_sorts_names_ignoring_case() {
    let store = MemoryStore::new(
        vec![
            user("E1", "bea", Some("Engineering"), "employee", true),
            user("A1", "Mia", Some("Engineering"), "Admin", true),
            user("E2", "Al", Some("engineering"), "employee", true),
            user("E3", "Cyd", Some("Finance"), "employee", true),
        ],
        Vec::new(),
    );

    let users = get_employee_list(&store, &EmployeeFilter::default())
        .await
        .unwrap();
    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Al", "bea", "Cyd"]);

    let filter = EmployeeFilter {
        department: Some("ENGINEERING".to_string()),
        exclude_admins: true,
    };
    let users = get_employee_list(&store, &filter).await.unwrap();
    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Al", "bea"]);

    assert_eq!(store.admin_employee_ids().await.unwrap(), vec!["A1".to_string()]);
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[tokio::test]
async fn org_wide_report_combines_every_section() {
    let mut store = roster_store();
    store
        .add_attendance(present("E1", date(2026, 3, 2), 9, Some(8.0)))
        .add_attendance(present("E2", date(2026, 3, 2), 10, Some(7.0)))
        .add_attendance(present("A1", date(2026, 3, 2), 7, Some(12.0)));

    let report = build_attendance_report_on(&store, ReportScope::default(), today())
        .await
        .unwrap();

    assert_eq!(report.generated_on, today());
    assert_eq!(report.metrics.total_days_analyzed, 2);
    assert!(matches!(report.metrics.department_comparison, Some(Some(_))));
    assert!(report.anomalies.is_empty());
    assert_eq!(report.employees.len(), 3);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["metrics"].get("absence_trend").is_none());
    assert_eq!(json["scope"]["roster"]["exclude_admins"], true);
}

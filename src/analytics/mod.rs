pub mod anomalies;
pub mod frame;
pub mod metrics;
pub mod report;
pub mod roster;
pub mod stats;

pub use anomalies::{Anomaly, AnomalyKind, AnomalyValue, detect_attendance_anomalies};
pub use frame::{AttendanceFrame, AttendanceRow, load_attendance_frame};
pub use metrics::{AbsenceTrend, BehaviorMetrics, compute_behavior_metrics};
pub use report::{AttendanceReport, ReportScope, build_attendance_report};
pub use roster::get_employee_list;

//! Data access for the analytics.
//!
//! Every query the analytics issue goes through [`AttendanceStore`], so the
//! same computations run against MySQL in production and against
//! [`MemoryStore`] in tests and offline runs.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::model::attendance::Attendance;
use crate::model::department::DepartmentStats;
use crate::model::user::User;

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, sqlx::Error>;

/// Half-open date window: `start <= date`, and `date < end` when `end` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn from(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.is_none_or(|end| date < end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub exclude_admins: bool,
}

impl Default for EmployeeFilter {
    fn default() -> Self {
        Self {
            department: None,
            exclude_admins: true,
        }
    }
}

impl EmployeeFilter {
    /// Department to filter on; an empty name means no filter.
    pub fn department(&self) -> Option<&str> {
        self.department.as_deref().filter(|d| !d.is_empty())
    }
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Employee ids of every user whose role is `admin`.
    async fn admin_employee_ids(&self) -> StoreResult<Vec<String>>;

    async fn attendance_for_employee(&self, employee_id: &str) -> StoreResult<Vec<Attendance>>;

    /// All rows whose employee id is not in `excluded`.
    async fn attendance_excluding(&self, excluded: &[String]) -> StoreResult<Vec<Attendance>>;

    /// Number of `ABSENT` rows for the employee inside `range`.
    async fn count_absences(&self, employee_id: &str, range: DateRange) -> StoreResult<i64>;

    /// `AVG` over the single `COUNT` of `ABSENT` rows inside `range`. The
    /// outer average sees one value, so this is the count itself; `None`
    /// when the database yields NULL.
    async fn average_absence_count(
        &self,
        employee_id: &str,
        range: DateRange,
    ) -> StoreResult<Option<f64>>;

    /// Distinct employees with attendance and average duration per
    /// department, active non-admin users only.
    async fn department_stats(&self) -> StoreResult<Vec<DepartmentStats>>;

    /// Active users matching `filter`, ordered by name.
    async fn active_users(&self, filter: &EmployeeFilter) -> StoreResult<Vec<User>>;
}

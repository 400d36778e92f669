use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::{debug, error};

use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::model::department::DepartmentStats;
use crate::model::role::Role;
use crate::model::user::User;
use crate::store::{AttendanceStore, DateRange, EmployeeFilter, StoreResult};
use crate::utils::db_utils::{SqlFilter, SqlValue};

const ATTENDANCE_COLUMNS: &str = r#"
    employee_id,
    date,
    entry_time,
    exit_time,
    CAST(duration AS DOUBLE) AS duration,
    status
"#;

fn absence_filter(employee_id: &str, range: DateRange) -> SqlFilter {
    let mut filter = SqlFilter::new();
    filter
        .push("employee_id = ?", SqlValue::String(employee_id.to_string()))
        .push(
            "status = ?",
            SqlValue::String(AttendanceStatus::Absent.to_string()),
        )
        .push("date >= ?", SqlValue::Date(range.start));
    if let Some(end) = range.end {
        filter.push("date < ?", SqlValue::Date(end));
    }
    filter
}

async fn fetch_attendance(pool: &MySqlPool, filter: &SqlFilter) -> StoreResult<Vec<Attendance>> {
    let sql = format!(
        "SELECT {} FROM attendance {}",
        ATTENDANCE_COLUMNS,
        filter.where_clause()
    );
    debug!(sql = %sql, bindings = ?filter.values(), "Fetching attendance");

    filter
        .bind_to(sqlx::query_as::<_, Attendance>(&sql))
        .fetch_all(pool)
        .await
        .inspect_err(|e| error!(error = %e, sql = %sql, "Failed to fetch attendance"))
}

#[async_trait]
impl AttendanceStore for MySqlPool {
    async fn admin_employee_ids(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT employee_id
            FROM users
            WHERE role = ?
            "#,
        )
        .bind(Role::Admin.to_string())
        .fetch_all(self)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to fetch admin ids"))?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn attendance_for_employee(&self, employee_id: &str) -> StoreResult<Vec<Attendance>> {
        let mut filter = SqlFilter::new();
        filter.push("employee_id = ?", SqlValue::String(employee_id.to_string()));
        fetch_attendance(self, &filter).await
    }

    async fn attendance_excluding(&self, excluded: &[String]) -> StoreResult<Vec<Attendance>> {
        let mut filter = SqlFilter::new();
        filter.push_not_in("employee_id", excluded);
        fetch_attendance(self, &filter).await
    }

    async fn count_absences(&self, employee_id: &str, range: DateRange) -> StoreResult<i64> {
        let filter = absence_filter(employee_id, range);
        let sql = format!("SELECT COUNT(*) FROM attendance {}", filter.where_clause());
        debug!(sql = %sql, bindings = ?filter.values(), "Counting absences");

        let (count,) = filter
            .bind_to(sqlx::query_as::<_, (i64,)>(&sql))
            .fetch_one(self)
            .await
            .inspect_err(|e| error!(error = %e, employee_id, "Failed to count absences"))?;

        Ok(count)
    }

    async fn average_absence_count(
        &self,
        employee_id: &str,
        range: DateRange,
    ) -> StoreResult<Option<f64>> {
        let filter = absence_filter(employee_id, range);
        let sql = format!(
            r#"
            SELECT CAST(AVG(absences) AS DOUBLE)
            FROM (SELECT COUNT(*) AS absences FROM attendance {}) AS windowed
            "#,
            filter.where_clause()
        );
        debug!(sql = %sql, bindings = ?filter.values(), "Averaging absences");

        let (average,) = filter
            .bind_to(sqlx::query_as::<_, (Option<f64>,)>(&sql))
            .fetch_one(self)
            .await
            .inspect_err(|e| error!(error = %e, employee_id, "Failed to average absences"))?;

        Ok(average)
    }

    async fn department_stats(&self) -> StoreResult<Vec<DepartmentStats>> {
        sqlx::query_as::<_, DepartmentStats>(
            r#"
            SELECT
                u.department AS department,
                COUNT(DISTINCT a.employee_id) AS emp_count,
                CAST(AVG(a.duration) AS DOUBLE) AS avg_duration
            FROM users u
            JOIN attendance a ON u.employee_id = a.employee_id
            WHERE u.is_active = ?
            AND u.role != ?
            GROUP BY u.department
            "#,
        )
        .bind(true)
        .bind(Role::Admin.to_string())
        .fetch_all(self)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to aggregate departments"))
    }

    async fn active_users(&self, filter: &EmployeeFilter) -> StoreResult<Vec<User>> {
        let mut conditions = SqlFilter::new();
        conditions.push("is_active = ?", SqlValue::Bool(true));
        if filter.exclude_admins {
            conditions.push("role != ?", SqlValue::String(Role::Admin.to_string()));
        }
        if let Some(department) = filter.department() {
            conditions.push("department = ?", SqlValue::String(department.to_string()));
        }

        let sql = format!(
            "SELECT employee_id, name, department, role, is_active FROM users {} ORDER BY name ASC",
            conditions.where_clause()
        );
        debug!(sql = %sql, bindings = ?conditions.values(), "Fetching active users");

        conditions
            .bind_to(sqlx::query_as::<_, User>(&sql))
            .fetch_all(self)
            .await
            .inspect_err(|e| error!(error = %e, sql = %sql, "Failed to fetch users"))
    }
}

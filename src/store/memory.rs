use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;

use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::model::department::DepartmentStats;
use crate::model::user::User;
use crate::store::{AttendanceStore, DateRange, EmployeeFilter, StoreResult};

/// In-process store answering the same queries as the MySQL backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Vec<User>,
    attendance: Vec<Attendance>,
}

impl MemoryStore {
    pub fn new(users: Vec<User>, attendance: Vec<Attendance>) -> Self {
        Self { users, attendance }
    }

    pub fn add_user(&mut self, user: User) -> &mut Self {
        self.users.push(user);
        self
    }

    pub fn add_attendance(&mut self, record: Attendance) -> &mut Self {
        self.attendance.push(record);
        self
    }

    fn absences<'a>(
        &'a self,
        employee_id: &'a str,
        range: DateRange,
    ) -> impl Iterator<Item = &'a Attendance> + 'a {
        self.attendance.iter().filter(move |a| {
            a.employee_id == employee_id
                && a.status == AttendanceStatus::Absent.as_ref()
                && range.contains(a.date)
        })
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn admin_employee_ids(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.is_admin())
            .map(|u| u.employee_id.clone())
            .collect())
    }

    async fn attendance_for_employee(&self, employee_id: &str) -> StoreResult<Vec<Attendance>> {
        Ok(self
            .attendance
            .iter()
            .filter(|a| a.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn attendance_excluding(&self, excluded: &[String]) -> StoreResult<Vec<Attendance>> {
        Ok(self
            .attendance
            .iter()
            .filter(|a| !excluded.contains(&a.employee_id))
            .cloned()
            .collect())
    }

    async fn count_absences(&self, employee_id: &str, range: DateRange) -> StoreResult<i64> {
        Ok(self.absences(employee_id, range).count() as i64)
    }

    async fn average_absence_count(
        &self,
        employee_id: &str,
        range: DateRange,
    ) -> StoreResult<Option<f64>> {
        // AVG over a single COUNT row
        Ok(Some(self.absences(employee_id, range).count() as f64))
    }

    async fn department_stats(&self) -> StoreResult<Vec<DepartmentStats>> {
        let departments: HashMap<&str, Option<&String>> = self
            .users
            .iter()
            .filter(|u| u.is_active && !u.is_admin())
            .map(|u| (u.employee_id.as_str(), u.department.as_ref()))
            .collect();

        #[derive(Default)]
        struct Group<'a> {
            employees: HashSet<&'a str>,
            duration_sum: f64,
            duration_count: usize,
        }

        let mut groups: BTreeMap<Option<&String>, Group> = BTreeMap::new();
        for record in &self.attendance {
            let Some(department) = departments.get(record.employee_id.as_str()) else {
                continue;
            };
            let group = groups.entry(*department).or_default();
            group.employees.insert(record.employee_id.as_str());
            // SQL AVG skips NULLs
            if let Some(duration) = record.duration {
                group.duration_sum += duration;
                group.duration_count += 1;
            }
        }

        Ok(groups
            .into_iter()
            .map(|(department, group)| DepartmentStats {
                department: department.cloned(),
                emp_count: group.employees.len() as i64,
                avg_duration: (group.duration_count > 0)
                    .then(|| group.duration_sum / group.duration_count as f64),
            })
            .collect())
    }

    async fn active_users(&self, filter: &EmployeeFilter) -> StoreResult<Vec<User>> {
        let department = filter.department();
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| u.is_active)
            .filter(|u| !(filter.exclude_admins && u.is_admin()))
            .filter(|u| {
                department.is_none_or(|d| {
                    u.department
                        .as_deref()
                        .is_some_and(|own| own.eq_ignore_ascii_case(d))
                })
            })
            .cloned()
            .collect();
        // Case-insensitive collation order
        users.sort_by_cached_key(|u| u.name.to_lowercase());
        Ok(users)
    }
}

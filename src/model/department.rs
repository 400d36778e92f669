use serde::{Deserialize, Serialize};

/// Raw per-department aggregate as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DepartmentStats {
    pub department: Option<String>,
    pub emp_count: i64,
    pub avg_duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentComparison {
    pub department: String,
    pub employees: i64,
    pub avg_work_hours: f64,
}

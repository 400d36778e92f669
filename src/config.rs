use std::env;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use tracing::Level;

use crate::analytics::ReportScope;
use crate::store::EmployeeFilter;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,

    // Logging
    pub log_dir: String,
    pub log_file: String,
    pub log_level: Level,

    // Report scope
    pub report_employee_id: Option<String>,
    pub report_department: Option<String>,
    pub report_include_admins: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let log_level = var("LOG_LEVEL").unwrap_or_else(|| "debug".to_string());
        let include_admins =
            var("REPORT_INCLUDE_ADMINS").unwrap_or_else(|| "false".to_string());

        Ok(Self {
            database_url: var("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?,
            log_dir: var("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_file: var("LOG_FILE").unwrap_or_else(|| "analytics.log".to_string()),
            log_level: log_level
                .parse()
                .with_context(|| format!("LOG_LEVEL is not a tracing level: {}", log_level))?,
            report_employee_id: var("REPORT_EMPLOYEE_ID"),
            report_department: var("REPORT_DEPARTMENT"),
            report_include_admins: include_admins.parse().with_context(|| {
                format!("REPORT_INCLUDE_ADMINS must be true or false: {}", include_admins)
            })?,
        })
    }

    pub fn report_scope(&self) -> ReportScope {
        ReportScope {
            employee_id: self.report_employee_id.clone(),
            roster: EmployeeFilter {
                department: self.report_department.clone(),
                exclude_admins: !self.report_include_admins,
            },
        }
    }
}

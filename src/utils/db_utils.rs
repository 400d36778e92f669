use chrono::NaiveDate;
use sqlx::mysql::MySqlArguments;
use sqlx::query::QueryAs;
use sqlx::MySql;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Bool(bool),
    Date(NaiveDate),
}

/// ===============================
/// WHERE clause container
/// ===============================
#[derive(Debug, Default)]
pub struct SqlFilter {
    conditions: Vec<String>,
    values: Vec<SqlValue>,
}

impl SqlFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Condition with exactly one `?` placeholder.
    pub fn push(&mut self, condition: &str, value: SqlValue) -> &mut Self {
        self.conditions.push(condition.to_string());
        self.values.push(value);
        self
    }

    /// `column NOT IN (?, ?, ...)`. An empty set adds nothing, since MySQL
    /// rejects `NOT IN ()`.
    pub fn push_not_in(&mut self, column: &str, values: &[String]) -> &mut Self {
        if values.is_empty() {
            return self;
        }

        let placeholders = vec!["?"; values.len()].join(", ");
        self.conditions
            .push(format!("{} NOT IN ({})", column, placeholders));
        self.values
            .extend(values.iter().cloned().map(SqlValue::String));
        self
    }

    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            "".to_string()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Bind every collected value, in order, onto a `query_as`.
    pub fn bind_to<'q, T>(
        &self,
        mut query: QueryAs<'q, MySql, T, MySqlArguments>,
    ) -> QueryAs<'q, MySql, T, MySqlArguments> {
        for value in &self.values {
            query = match value.clone() {
                SqlValue::String(v) => query.bind(v),
                SqlValue::Bool(v) => query.bind(v),
                SqlValue::Date(v) => query.bind(v),
            };
        }
        query
    }
}

use chrono::NaiveDate;
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Date(NaiveDate),
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Collects `column = ?` assignments for a single-row UPDATE.
///
/// Column names are `&'static str` so only identifiers chosen in code ever reach the SQL text.
#[derive(Debug)]
pub struct UpdateBuilder {
    table: &'static str,
    columns: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn set(mut self, column: &'static str, value: SqlValue) -> Self {
        self.columns.push(column);
        self.values.push(value);
        self
    }

    /// Adds the assignment only when the value changed.
    pub fn set_if_changed<T>(self, column: &'static str, old: &T, new: &T, to_sql: impl FnOnce(&T) -> SqlValue) -> Self
    where
        T: PartialEq,
    {
        if old == new {
            self
        } else {
            let value = to_sql(new);
            self.set(column, value)
        }
    }

    /// ===============================
    /// Build dynamic UPDATE SQL
    /// ===============================
    pub fn build(self, id_column: &'static str, id_value: u64) -> Option<SqlUpdate> {
        if self.columns.is_empty() {
            return None;
        }

        let set_clause = self
            .columns
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!("UPDATE {} SET {} WHERE {} = ?", self.table, set_clause, id_column);

        let mut values = self.values;
        // WHERE id = ?
        values.push(SqlValue::U64(id_value));

        Some(SqlUpdate { sql, values })
    }
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

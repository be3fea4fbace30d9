use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

use crate::error::{LeaveError, LeaveResult};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Only keys listed in `columns` may appear in the payload; column names are
/// interpolated into the statement, values are always bound.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    columns: &[&str],
    id_column: &str,
    id_value: u64,
) -> LeaveResult<SqlUpdate> {
    let obj = payload
        .as_object()
        .ok_or_else(|| LeaveError::InvalidInput("payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(LeaveError::InvalidInput("no fields to update".into()));
    }

    if let Some(unknown) = obj.keys().find(|k| !columns.contains(&k.as_str())) {
        return Err(LeaveError::InvalidInput(format!("unknown field '{unknown}'")));
    }

    // Build SET clause
    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table, set_clause, id_column
    );

    let mut values = Vec::with_capacity(obj.len() + 1);

    // Convert JSON values → SqlValue
    for (key, value) in obj {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    values.push(SqlValue::DateTime(dt));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    values.push(SqlValue::U64(u));
                } else if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => {
                return Err(LeaveError::InvalidInput(format!(
                    "unsupported value for '{key}'"
                )));
            }
        }
    }

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: &[&str] = &["name", "annual_quota", "is_active"];

    #[test]
    fn builds_set_clause_from_payload_keys() {
        let update = build_update_sql(
            "leave_types",
            &json!({"annual_quota": 14, "is_active": false}),
            COLUMNS,
            "id",
            3,
        )
        .unwrap();
        assert_eq!(
            update.sql,
            "UPDATE leave_types SET annual_quota = ?, is_active = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![SqlValue::U64(14), SqlValue::Bool(false), SqlValue::U64(3)]
        );
    }

    #[test]
    fn rejects_columns_outside_the_whitelist() {
        let err = build_update_sql("leave_types", &json!({"id; DROP": 1}), COLUMNS, "id", 3)
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(build_update_sql("leave_types", &json!({}), COLUMNS, "id", 3).is_err());
        assert!(build_update_sql("leave_types", &json!([1]), COLUMNS, "id", 3).is_err());
    }
}

//! Change history repository. One row per changed field of a work order.

use rusqlite::{params, Connection, Row};

use serde::{Deserialize, Serialize};

use super::DatabaseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub id: i64,
    pub work_order_id: String,
    /// Either a stage name (date changes) or a work order attribute.
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_at: String,
    pub changed_by: Option<String>,
}

impl HistoryRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            work_order_id: row.get("work_order_id")?,
            field: row.get("field")?,
            old_value: row.get("old_value")?,
            new_value: row.get("new_value")?,
            changed_at: row.get("changed_at")?,
            changed_by: row.get("changed_by")?,
        })
    }
}

/// A history row joined with its work order number and author email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRow {
    pub history: HistoryRow,
    pub ot: String,
    pub email: Option<String>,
}

impl ChangeRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            history: HistoryRow::from_row(row)?,
            ot: row.get("ot")?,
            email: row.get("email")?,
        })
    }
}

/// Appends a history row. The `id` of the argument is ignored.
pub fn insert(conn: &Connection, row: &HistoryRow) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO work_order_history (work_order_id, field, old_value, new_value,
         changed_at, changed_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            row.work_order_id,
            row.field,
            row.old_value,
            row.new_value,
            row.changed_at,
            row.changed_by,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// History of one work order with author emails, newest first.
pub fn list_for_work_order(
    conn: &Connection,
    work_order_id: &str,
) -> Result<Vec<ChangeRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT h.*, w.ot AS ot, u.email AS email
         FROM work_order_history h
         JOIN work_orders w ON w.id = h.work_order_id
         LEFT JOIN users u ON u.id = h.changed_by
         WHERE h.work_order_id = ?1
         ORDER BY h.changed_at DESC, h.id DESC",
    )?;
    let rows = stmt
        .query_map(params![work_order_id], ChangeRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Latest changes across all work orders, skipping the given fields.
pub fn recent_changes(
    conn: &Connection,
    exclude_fields: &[&str],
    limit: u32,
) -> Result<Vec<ChangeRow>, DatabaseError> {
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut placeholders = Vec::new();
    for field in exclude_fields {
        param_values.push(Box::new(field.to_string()));
        placeholders.push(format!("?{}", param_values.len()));
    }

    let where_clause = if placeholders.is_empty() {
        String::new()
    } else {
        format!("WHERE h.field NOT IN ({})", placeholders.join(", "))
    };

    param_values.push(Box::new(i64::from(limit)));
    let sql = format!(
        "SELECT h.*, w.ot AS ot, u.email AS email
         FROM work_order_history h
         JOIN work_orders w ON w.id = h.work_order_id
         LEFT JOIN users u ON u.id = h.changed_by
         {} ORDER BY h.changed_at DESC, h.id DESC LIMIT ?{}",
        where_clause,
        param_values.len()
    );

    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_ref.as_slice(), ChangeRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_all(conn: &Connection) -> Result<Vec<HistoryRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM work_order_history ORDER BY id")?;
    let rows = stmt
        .query_map([], HistoryRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

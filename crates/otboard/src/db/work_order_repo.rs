//! CRUD operations for the `work_orders` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use serde::{Deserialize, Serialize};

use super::DatabaseError;

/// A raw work order row from the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderRow {
    pub id: String,
    pub ot: String,
    pub client: String,
    pub description: String,
    pub tag: String,
    pub location: String,
    pub status: String,
    pub progress: i64,
    pub priority: bool,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl WorkOrderRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            ot: row.get("ot")?,
            client: row.get("client")?,
            description: row.get("description")?,
            tag: row.get("tag")?,
            location: row.get("location")?,
            status: row.get("status")?,
            progress: row.get("progress")?,
            priority: row.get("priority")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            created_by: row.get("created_by")?,
            updated_by: row.get("updated_by")?,
        })
    }
}

/// Derived fields written after a stage date change.
#[derive(Debug, Clone)]
pub struct StatusChange<'a> {
    pub status: &'a str,
    pub progress: i64,
    /// `None` leaves the stored location untouched.
    pub location: Option<&'a str>,
    pub updated_at: &'a str,
    pub updated_by: &'a str,
}

/// Inserts a new work order row.
pub fn insert(conn: &Connection, wo: &WorkOrderRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO work_orders (id, ot, client, description, tag, location, status,
         progress, priority, created_at, updated_at, created_by, updated_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            wo.id,
            wo.ot,
            wo.client,
            wo.description,
            wo.tag,
            wo.location,
            wo.status,
            wo.progress,
            wo.priority,
            wo.created_at,
            wo.updated_at,
            wo.created_by,
            wo.updated_by,
        ],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<WorkOrderRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM work_orders WHERE id = ?1",
            params![id],
            WorkOrderRow::from_row,
        )
        .optional()?;
    Ok(row)
}

pub fn find_by_ot(conn: &Connection, ot: &str) -> Result<Option<WorkOrderRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM work_orders WHERE ot = ?1",
            params![ot],
            WorkOrderRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Returns all work orders, newest first.
pub fn list_all(conn: &Connection) -> Result<Vec<WorkOrderRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM work_orders ORDER BY created_at DESC, ot DESC")?;
    let rows = stmt
        .query_map([], WorkOrderRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Writes status, progress and (optionally) location together.
pub fn update_status(
    conn: &Connection,
    id: &str,
    change: &StatusChange<'_>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE work_orders SET status = ?2, progress = ?3, location = COALESCE(?4, location),
         updated_at = ?5, updated_by = ?6 WHERE id = ?1",
        params![
            id,
            change.status,
            change.progress,
            change.location,
            change.updated_at,
            change.updated_by,
        ],
    )?;
    Ok(())
}

/// Updates only the audit fields.
pub fn touch(
    conn: &Connection,
    id: &str,
    updated_at: &str,
    updated_by: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE work_orders SET updated_at = ?2, updated_by = ?3 WHERE id = ?1",
        params![id, updated_at, updated_by],
    )?;
    Ok(())
}

pub fn set_priority(
    conn: &Connection,
    id: &str,
    priority: bool,
    updated_at: &str,
    updated_by: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE work_orders SET priority = ?2, updated_at = ?3, updated_by = ?4 WHERE id = ?1",
        params![id, priority, updated_at, updated_by],
    )?;
    Ok(())
}

/// Removes every work order; dependent rows go with them via `ON DELETE CASCADE`.
pub fn delete_all(conn: &Connection) -> Result<usize, DatabaseError> {
    Ok(conn.execute("DELETE FROM work_orders", [])?)
}

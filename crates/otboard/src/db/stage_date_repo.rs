//! Stage date repository, holding one planned or confirmed date per (work order, stage).

use rusqlite::{params, Connection, OptionalExtension, Row};

use serde::{Deserialize, Serialize};

use super::DatabaseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDateRow {
    pub work_order_id: String,
    pub stage: String,
    /// `YYYY-MM-DD`, absent while the stage is not scheduled.
    pub date: Option<String>,
    pub confirmed: bool,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl StageDateRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            work_order_id: row.get("work_order_id")?,
            stage: row.get("stage")?,
            date: row.get("date")?,
            confirmed: row.get("confirmed")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            created_by: row.get("created_by")?,
            updated_by: row.get("updated_by")?,
        })
    }
}

/// Writes the date for a stage, updating the existing row in place when the
/// work order already has one for that stage.
pub fn upsert(
    conn: &Connection,
    work_order_id: &str,
    stage: &str,
    date: Option<&str>,
    confirmed: bool,
    now: &str,
    user_id: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO stage_dates (work_order_id, stage, date, confirmed,
         created_at, updated_at, created_by, updated_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?6)
         ON CONFLICT(work_order_id, stage) DO UPDATE SET
           date = excluded.date,
           confirmed = excluded.confirmed,
           updated_at = excluded.updated_at,
           updated_by = excluded.updated_by",
        params![work_order_id, stage, date, confirmed, now, user_id],
    )?;
    Ok(())
}

/// Inserts a row verbatim (used when restoring backups).
pub fn insert(conn: &Connection, row: &StageDateRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO stage_dates (work_order_id, stage, date, confirmed,
         created_at, updated_at, created_by, updated_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            row.work_order_id,
            row.stage,
            row.date,
            row.confirmed,
            row.created_at,
            row.updated_at,
            row.created_by,
            row.updated_by,
        ],
    )?;
    Ok(())
}

pub fn find(
    conn: &Connection,
    work_order_id: &str,
    stage: &str,
) -> Result<Option<StageDateRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM stage_dates WHERE work_order_id = ?1 AND stage = ?2",
            params![work_order_id, stage],
            StageDateRow::from_row,
        )
        .optional()?;
    Ok(row)
}

pub fn list_for_work_order(
    conn: &Connection,
    work_order_id: &str,
) -> Result<Vec<StageDateRow>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT * FROM stage_dates WHERE work_order_id = ?1 ORDER BY id")?;
    let rows = stmt
        .query_map(params![work_order_id], StageDateRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_all(conn: &Connection) -> Result<Vec<StageDateRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM stage_dates ORDER BY work_order_id, id")?;
    let rows = stmt
        .query_map([], StageDateRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

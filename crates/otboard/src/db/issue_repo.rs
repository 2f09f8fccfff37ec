//! Issue repository for problems raised against a stage of a work order and
//! the notes attached to them.

use rusqlite::{params, Connection, OptionalExtension, Row};

use serde::{Deserialize, Serialize};

use super::DatabaseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRow {
    pub id: i64,
    pub work_order_id: String,
    pub stage: String,
    pub title: String,
    /// `OPEN` or `CLOSED`.
    pub status: String,
    pub delay_start: Option<String>,
    pub delay_end: Option<String>,
    pub created_at: String,
    pub created_by: Option<String>,
}

impl IssueRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            work_order_id: row.get("work_order_id")?,
            stage: row.get("stage")?,
            title: row.get("title")?,
            status: row.get("status")?,
            delay_start: row.get("delay_start")?,
            delay_end: row.get("delay_end")?,
            created_at: row.get("created_at")?,
            created_by: row.get("created_by")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRow {
    pub id: i64,
    pub issue_id: i64,
    pub content: String,
    pub created_at: String,
    pub created_by: Option<String>,
}

impl NoteRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            issue_id: row.get("issue_id")?,
            content: row.get("content")?,
            created_at: row.get("created_at")?,
            created_by: row.get("created_by")?,
        })
    }
}

/// Inserts an issue and returns its new id. The `id` of the argument is ignored.
pub fn insert_issue(conn: &Connection, issue: &IssueRow) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO issues (work_order_id, stage, title, status, delay_start, delay_end,
         created_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            issue.work_order_id,
            issue.stage,
            issue.title,
            issue.status,
            issue.delay_start,
            issue.delay_end,
            issue.created_at,
            issue.created_by,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Inserts an issue keeping its id, so restored notes still point at it.
pub fn restore_issue(conn: &Connection, issue: &IssueRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO issues (id, work_order_id, stage, title, status, delay_start, delay_end,
         created_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            issue.id,
            issue.work_order_id,
            issue.stage,
            issue.title,
            issue.status,
            issue.delay_start,
            issue.delay_end,
            issue.created_at,
            issue.created_by,
        ],
    )?;
    Ok(())
}

pub fn find_issue(conn: &Connection, id: i64) -> Result<Option<IssueRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM issues WHERE id = ?1",
            params![id],
            IssueRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Marks an issue closed, ending an open delay at `delay_end`.
pub fn close_issue(conn: &Connection, id: i64, delay_end: &str) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE issues SET status = 'CLOSED',
         delay_end = CASE WHEN delay_start IS NOT NULL THEN COALESCE(delay_end, ?2) ELSE delay_end END
         WHERE id = ?1",
        params![id, delay_end],
    )?;
    Ok(changed > 0)
}

/// Issues of a work order, newest first.
pub fn list_for_work_order(
    conn: &Connection,
    work_order_id: &str,
) -> Result<Vec<IssueRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT * FROM issues WHERE work_order_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt
        .query_map(params![work_order_id], IssueRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_open_for_stage(
    conn: &Connection,
    work_order_id: &str,
    stage: &str,
) -> Result<u64, DatabaseError> {
    let count: u64 = conn.query_row(
        "SELECT COUNT(*) FROM issues WHERE work_order_id = ?1 AND stage = ?2 AND status = 'OPEN'",
        params![work_order_id, stage],
        |r| r.get(0),
    )?;
    Ok(count)
}

pub fn insert_note(conn: &Connection, note: &NoteRow) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO issue_notes (issue_id, content, created_at, created_by)
         VALUES (?1, ?2, ?3, ?4)",
        params![note.issue_id, note.content, note.created_at, note.created_by],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Notes on all issues of a work order, with the author's email when known.
pub fn notes_for_work_order(
    conn: &Connection,
    work_order_id: &str,
) -> Result<Vec<(NoteRow, Option<String>)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT n.*, u.email AS email FROM issue_notes n
         JOIN issues i ON i.id = n.issue_id
         LEFT JOIN users u ON u.id = n.created_by
         WHERE i.work_order_id = ?1
         ORDER BY n.created_at DESC, n.id DESC",
    )?;
    let rows = stmt
        .query_map(params![work_order_id], |row| {
            let email: Option<String> = row.get("email")?;
            Ok((NoteRow::from_row(row)?, email))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_all_issues(conn: &Connection) -> Result<Vec<IssueRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM issues ORDER BY id")?;
    let rows = stmt
        .query_map([], IssueRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_all_notes(conn: &Connection) -> Result<Vec<NoteRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM issue_notes ORDER BY id")?;
    let rows = stmt
        .query_map([], NoteRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

//! Full backups of work order data as a single JSON document.
//!
//! A restore replaces every work order together with its stage dates,
//! history, issues and notes. Users are not part of a backup.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::auth::{Actor, Capability};
use crate::broadcast::ChangeEvent;
use crate::db::history_repo::{self, HistoryRow};
use crate::db::issue_repo::{self, IssueRow, NoteRow};
use crate::db::stage_date_repo::{self, StageDateRow};
use crate::db::work_order_repo::{self, WorkOrderRow};
use crate::error::{BackupError, Result};
use crate::stages::Location;
use crate::store::WorkOrderStore;

pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub work_orders: Vec<WorkOrderRow>,
    #[serde(default)]
    pub stage_dates: Vec<StageDateRow>,
    #[serde(default)]
    pub history: Vec<HistoryRow>,
    #[serde(default)]
    pub issues: Vec<IssueRow>,
    #[serde(default)]
    pub issue_notes: Vec<NoteRow>,
}

impl Backup {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(BackupError::Parse)?)
    }

    /// Suggested file name, e.g. `backup_2026-03-09.json`.
    pub fn file_name(&self) -> String {
        format!("backup_{}.json", self.created_at.format("%Y-%m-%d"))
    }

    /// Checks the references and values a restore relies on.
    pub fn validate(&self) -> std::result::Result<(), BackupError> {
        if self.version != BACKUP_VERSION {
            return Err(BackupError::UnsupportedVersion(self.version));
        }

        let mut ids = HashSet::new();
        let mut ots = HashSet::new();
        for wo in &self.work_orders {
            if !ids.insert(wo.id.as_str()) {
                return Err(invalid(format!("duplicate work order id '{}'", wo.id)));
            }
            if wo.ot.trim().is_empty() {
                return Err(invalid(format!("work order '{}' has an empty OT", wo.id)));
            }
            if !ots.insert(wo.ot.as_str()) {
                return Err(invalid(format!("duplicate OT {}", wo.ot)));
            }
            if let Err(e) = wo.location.parse::<Location>() {
                return Err(invalid(format!("OT {}: {}", wo.ot, e)));
            }
            if !(0..=100).contains(&wo.progress) {
                return Err(invalid(format!("OT {}: progress {} out of range", wo.ot, wo.progress)));
            }
            for ts in [&wo.created_at, &wo.updated_at] {
                check_timestamp(&format!("OT {}", wo.ot), ts)?;
            }
        }

        let mut stages = HashSet::new();
        for d in &self.stage_dates {
            if !ids.contains(d.work_order_id.as_str()) {
                return Err(unknown_work_order("stage date", &d.work_order_id));
            }
            if !stages.insert((d.work_order_id.as_str(), d.stage.as_str())) {
                return Err(invalid(format!(
                    "duplicate date for stage '{}' of work order '{}'",
                    d.stage, d.work_order_id
                )));
            }
            if let Some(date) = &d.date {
                check_date(&format!("stage '{}'", d.stage), date)?;
            }
        }

        for h in &self.history {
            if !ids.contains(h.work_order_id.as_str()) {
                return Err(unknown_work_order("history entry", &h.work_order_id));
            }
            check_timestamp(&format!("history entry {}", h.id), &h.changed_at)?;
        }

        let mut issue_ids = HashSet::new();
        for issue in &self.issues {
            if !ids.contains(issue.work_order_id.as_str()) {
                return Err(unknown_work_order("issue", &issue.work_order_id));
            }
            if !issue_ids.insert(issue.id) {
                return Err(invalid(format!("duplicate issue id {}", issue.id)));
            }
            if issue.status != "OPEN" && issue.status != "CLOSED" {
                return Err(invalid(format!(
                    "issue {} has unknown status '{}'",
                    issue.id, issue.status
                )));
            }
            let what = format!("issue {}", issue.id);
            check_timestamp(&what, &issue.created_at)?;
            for date in [&issue.delay_start, &issue.delay_end].into_iter().flatten() {
                check_date(&what, date)?;
            }
        }

        for note in &self.issue_notes {
            if !issue_ids.contains(&note.issue_id) {
                return Err(invalid(format!(
                    "note {} refers to unknown issue {}",
                    note.id, note.issue_id
                )));
            }
            check_timestamp(&format!("note {}", note.id), &note.created_at)?;
        }

        Ok(())
    }
}

fn invalid(message: String) -> BackupError {
    BackupError::Invalid(message)
}

fn check_timestamp(what: &str, value: &str) -> std::result::Result<(), BackupError> {
    DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .map_err(|_| invalid(format!("{}: bad timestamp '{}'", what, value)))
}

fn check_date(what: &str, value: &str) -> std::result::Result<(), BackupError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| invalid(format!("{}: bad date '{}'", what, value)))
}

fn unknown_work_order(what: &str, id: &str) -> BackupError {
    invalid(format!("{} refers to unknown work order '{}'", what, id))
}

/// Counts of restored records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RestoreSummary {
    pub work_orders: usize,
    pub stage_dates: usize,
    pub history: usize,
    pub issues: usize,
    pub issue_notes: usize,
}

/// Snapshots all work order data.
pub fn create_backup(store: &WorkOrderStore, actor: &Actor) -> Result<Backup> {
    actor.require(Capability::ManageBackups)?;
    let _span = info_span!("create_backup", actor = %actor.email).entered();

    let backup = store.database().with_conn(|conn| -> Result<Backup> {
        let tx = conn.unchecked_transaction()?;
        let backup = Backup {
            version: BACKUP_VERSION,
            created_at: Utc::now(),
            work_orders: work_order_repo::list_all(&tx)?,
            stage_dates: stage_date_repo::list_all(&tx)?,
            history: history_repo::list_all(&tx)?,
            issues: issue_repo::list_all_issues(&tx)?,
            issue_notes: issue_repo::list_all_notes(&tx)?,
        };
        tx.commit()?;
        Ok(backup)
    })?;

    info!(
        "Backup created with {} work orders",
        backup.work_orders.len()
    );
    Ok(backup)
}

/// Replaces all work order data with the contents of a JSON backup.
///
/// Nothing is written unless the whole document parses and validates.
pub fn restore_backup(store: &WorkOrderStore, actor: &Actor, json: &str) -> Result<RestoreSummary> {
    actor.require(Capability::ManageBackups)?;
    let _span = info_span!("restore_backup", actor = %actor.email).entered();

    let backup: Backup = serde_json::from_str(json).map_err(BackupError::Parse)?;
    if let Err(e) = backup.validate() {
        warn!("Rejected backup: {}", e);
        return Err(e.into());
    }

    let summary = store.database().with_conn(|conn| -> Result<RestoreSummary> {
        let tx = conn.unchecked_transaction()?;
        let removed = work_order_repo::delete_all(&tx)?;
        log::debug!("Removed {} work orders before restore", removed);

        for wo in &backup.work_orders {
            work_order_repo::insert(&tx, wo)?;
        }
        for d in &backup.stage_dates {
            stage_date_repo::insert(&tx, d)?;
        }
        for h in &backup.history {
            history_repo::insert(&tx, h)?;
        }
        for issue in &backup.issues {
            issue_repo::restore_issue(&tx, issue)?;
        }
        for note in &backup.issue_notes {
            issue_repo::insert_note(&tx, note)?;
        }
        tx.commit()?;

        Ok(RestoreSummary {
            work_orders: backup.work_orders.len(),
            stage_dates: backup.stage_dates.len(),
            history: backup.history.len(),
            issues: backup.issues.len(),
            issue_notes: backup.issue_notes.len(),
        })
    })?;

    info!(
        "Restored backup from {} ({} work orders)",
        backup.created_at, summary.work_orders
    );
    store.feed().publish(ChangeEvent::restored());
    Ok(summary)
}

use chrono::{NaiveDate, Utc};
use tracing::{info, info_span};

use crate::auth::Actor;
use crate::broadcast::ChangeEvent;
use crate::db::issue_repo::{self, IssueRow, NoteRow};
use crate::db::{format_date, format_timestamp};
use crate::error::{Result, WorkOrderError};
use crate::model::{Issue, IssueStatus};

use super::WorkOrderStore;

impl WorkOrderStore {
    /// Raises an issue against one stage. A `delay_start` marks the issue as
    /// holding the order up from that day on.
    pub fn open_issue(
        &self,
        actor: &Actor,
        work_order_id: &str,
        stage: &str,
        title: &str,
        delay_start: Option<NaiveDate>,
    ) -> Result<Issue> {
        let _span = info_span!("open_issue", id = %work_order_id, stage = %stage).entered();

        let title = title.trim();
        if title.is_empty() {
            return Err(WorkOrderError::InvalidField {
                field: "title",
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        if !self.catalog.contains(stage) {
            return Err(WorkOrderError::UnknownStage(stage.to_string()).into());
        }

        let (issue, ot) = self.db.with_conn(|conn| -> Result<(Issue, String)> {
            let wo = self.require_work_order(conn, work_order_id)?;
            let row = IssueRow {
                id: 0,
                work_order_id: wo.id.clone(),
                stage: stage.to_string(),
                title: title.to_string(),
                status: IssueStatus::Open.as_str().to_string(),
                delay_start: delay_start.map(format_date),
                delay_end: None,
                created_at: format_timestamp(Utc::now()),
                created_by: Some(actor.id.clone()),
            };
            let id = issue_repo::insert_issue(conn, &row)?;
            let stored = issue_repo::find_issue(conn, id)?
                .ok_or(WorkOrderError::IssueNotFound(id))?;
            Ok((Issue::from_row(&stored)?, wo.ot))
        })?;

        info!("Opened issue {} on OT {} ({})", issue.id, ot, stage);
        self.feed.publish(ChangeEvent::updated(&issue.work_order_id, &ot));
        Ok(issue)
    }

    /// Closes an issue. An open delay ends on `today`.
    pub fn close_issue(&self, actor: &Actor, issue_id: i64, today: NaiveDate) -> Result<Issue> {
        let _span = info_span!("close_issue", issue_id).entered();

        let (issue, ot) = self.db.with_conn(|conn| -> Result<(Issue, String)> {
            let existing = issue_repo::find_issue(conn, issue_id)?
                .ok_or(WorkOrderError::IssueNotFound(issue_id))?;
            let wo = self.require_work_order(conn, &existing.work_order_id)?;
            issue_repo::close_issue(conn, issue_id, &format_date(today))?;
            let closed = issue_repo::find_issue(conn, issue_id)?
                .ok_or(WorkOrderError::IssueNotFound(issue_id))?;
            Ok((Issue::from_row(&closed)?, wo.ot))
        })?;

        info!("{} closed issue {} on OT {}", actor.email, issue_id, ot);
        self.feed.publish(ChangeEvent::updated(&issue.work_order_id, &ot));
        Ok(issue)
    }

    /// Attaches a note to an issue and returns the note id.
    pub fn add_issue_note(&self, actor: &Actor, issue_id: i64, content: &str) -> Result<i64> {
        let content = content.trim();
        if content.is_empty() {
            return Err(WorkOrderError::InvalidField {
                field: "content",
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        let (note_id, work_order_id, ot) =
            self.db.with_conn(|conn| -> Result<(i64, String, String)> {
                let issue = issue_repo::find_issue(conn, issue_id)?
                    .ok_or(WorkOrderError::IssueNotFound(issue_id))?;
                let wo = self.require_work_order(conn, &issue.work_order_id)?;
                let note_id = issue_repo::insert_note(
                    conn,
                    &NoteRow {
                        id: 0,
                        issue_id,
                        content: content.to_string(),
                        created_at: format_timestamp(Utc::now()),
                        created_by: Some(actor.id.clone()),
                    },
                )?;
                Ok((note_id, wo.id, wo.ot))
            })?;

        self.feed.publish(ChangeEvent::updated(&work_order_id, &ot));
        Ok(note_id)
    }

    /// Issues of a work order, newest first.
    pub fn issues_for(&self, work_order_id: &str) -> Result<Vec<Issue>> {
        self.db.with_conn(|conn| -> Result<Vec<Issue>> {
            let mut issues = Vec::new();
            for row in issue_repo::list_for_work_order(conn, work_order_id)? {
                issues.push(Issue::from_row(&row)?);
            }
            Ok(issues)
        })
    }

    pub fn has_open_issue(&self, work_order_id: &str, stage: &str) -> Result<bool> {
        self.db.with_conn(|conn| -> Result<bool> {
            Ok(issue_repo::count_open_for_stage(conn, work_order_id, stage)? > 0)
        })
    }

    /// Total days the order was held up by issues, open delays counted up to `today`.
    pub fn total_delay_days(&self, work_order_id: &str, today: NaiveDate) -> Result<i64> {
        Ok(self
            .issues_for(work_order_id)?
            .iter()
            .map(|issue| issue.delay_days(today))
            .sum())
    }
}

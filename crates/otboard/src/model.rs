//! Domain types exposed by the store.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::issue_repo::IssueRow;
use crate::db::stage_date_repo::StageDateRow;
use crate::db::work_order_repo::WorkOrderRow;
use crate::db::{parse_date, parse_timestamp, DatabaseError};
use crate::resolver::StageMark;
use crate::stages::Location;

/// A scheduled or confirmed date for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDate {
    pub date: NaiveDate,
    pub confirmed: bool,
}

/// A work order together with its dated stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: String,
    pub ot: String,
    pub client: String,
    pub description: String,
    pub tag: String,
    /// `None` when the stored location is not a known pipeline.
    pub location: Option<Location>,
    pub status: String,
    pub progress: u8,
    pub priority: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    /// Stages that have a date, keyed by stage name. Stage rows without a
    /// date are left out.
    pub dates: BTreeMap<String, StageDate>,
}

impl WorkOrder {
    pub(crate) fn from_rows(
        row: &WorkOrderRow,
        dates: &[StageDateRow],
    ) -> Result<Self, DatabaseError> {
        let location = match row.location.parse::<Location>() {
            Ok(loc) => Some(loc),
            Err(e) => {
                log::warn!("Work order {}: {}", row.ot, e);
                None
            }
        };
        let progress = u8::try_from(row.progress).map_err(|_| DatabaseError::Corrupt {
            table: "work_orders",
            column: "progress",
            reason: format!("{} is out of range", row.progress),
        })?;

        let mut map = BTreeMap::new();
        for d in dates {
            if let Some(date) = &d.date {
                map.insert(
                    d.stage.clone(),
                    StageDate {
                        date: parse_date("stage_dates", "date", date)?,
                        confirmed: d.confirmed,
                    },
                );
            }
        }

        Ok(Self {
            id: row.id.clone(),
            ot: row.ot.clone(),
            client: row.client.clone(),
            description: row.description.clone(),
            tag: row.tag.clone(),
            location,
            status: row.status.clone(),
            progress,
            priority: row.priority,
            created_at: parse_timestamp("work_orders", "created_at", &row.created_at)?,
            updated_at: parse_timestamp("work_orders", "updated_at", &row.updated_at)?,
            created_by: row.created_by.clone(),
            updated_by: row.updated_by.clone(),
            dates: map,
        })
    }

    pub fn is_confirmed(&self, stage: &str) -> bool {
        self.dates.get(stage).map(|d| d.confirmed).unwrap_or(false)
    }

    pub fn date_of(&self, stage: &str) -> Option<NaiveDate> {
        self.dates.get(stage).map(|d| d.date)
    }
}

pub(crate) fn stage_marks(rows: &[StageDateRow]) -> Vec<StageMark> {
    rows.iter()
        .map(|r| StageMark::new(&r.stage, r.confirmed))
        .collect()
}

/// Fields supplied when a work order is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewWorkOrder {
    pub ot: String,
    pub client: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub description: String,
}

/// All work orders split by location, newest first within each list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Board {
    pub inco: Vec<WorkOrder>,
    pub anti: Vec<WorkOrder>,
    pub archived: Vec<WorkOrder>,
}

impl Board {
    pub fn len(&self) -> usize {
        self.inco.len() + self.anti.len() + self.archived.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Orders still moving through a pipeline.
    pub fn active(&self) -> impl Iterator<Item = &WorkOrder> {
        self.inco.iter().chain(self.anti.iter())
    }

    pub fn find_by_ot(&self, ot: &str) -> Option<&WorkOrder> {
        self.active()
            .chain(self.archived.iter())
            .find(|wo| wo.ot == ot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueStatus {
    Open,
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "OPEN",
            IssueStatus::Closed => "CLOSED",
        }
    }
}

/// A problem raised against one stage of a work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: i64,
    pub work_order_id: String,
    pub stage: String,
    pub title: String,
    pub status: IssueStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Issue {
    pub(crate) fn from_row(row: &IssueRow) -> Result<Self, DatabaseError> {
        let status = match row.status.as_str() {
            "OPEN" => IssueStatus::Open,
            "CLOSED" => IssueStatus::Closed,
            other => {
                return Err(DatabaseError::Corrupt {
                    table: "issues",
                    column: "status",
                    reason: format!("unknown status '{}'", other),
                })
            }
        };
        let date = |s: &Option<String>, column| {
            s.as_deref()
                .map(|v| parse_date("issues", column, v))
                .transpose()
        };
        Ok(Self {
            id: row.id,
            work_order_id: row.work_order_id.clone(),
            stage: row.stage.clone(),
            title: row.title.clone(),
            status,
            delay_start: date(&row.delay_start, "delay_start")?,
            delay_end: date(&row.delay_end, "delay_end")?,
            created_at: parse_timestamp("issues", "created_at", &row.created_at)?,
        })
    }

    /// Days lost to this issue, counting both ends. Open delays run until `today`.
    pub fn delay_days(&self, today: NaiveDate) -> i64 {
        match self.delay_start {
            Some(start) => {
                let end = self.delay_end.unwrap_or(today);
                ((end - start).num_days() + 1).max(0)
            }
            None => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineKind {
    Date,
    Status,
    Issue,
    Note,
}

/// One line in the merged history of a work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub kind: TimelineKind,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

/// A change from the global activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub work_order_id: String,
    pub ot: String,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    pub changed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

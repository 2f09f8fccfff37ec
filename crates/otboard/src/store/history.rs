use crate::db::history_repo::{self, ChangeRow};
use crate::db::issue_repo;
use crate::db::{parse_timestamp, DatabaseError};
use crate::error::Result;
use crate::model::{ChangeRecord, TimelineEntry, TimelineKind};

use super::WorkOrderStore;

/// Derived fields, left out of the global activity feed.
const DERIVED_FIELDS: [&str; 2] = ["status", "progress"];

impl WorkOrderStore {
    /// Latest changes across all work orders, newest first.
    pub fn change_history(&self, limit: u32) -> Result<Vec<ChangeRecord>> {
        self.db.with_conn(|conn| -> Result<Vec<ChangeRecord>> {
            let rows = history_repo::recent_changes(conn, &DERIVED_FIELDS, limit)?;
            let mut records = Vec::with_capacity(rows.len());
            for row in rows {
                records.push(change_record(row)?);
            }
            Ok(records)
        })
    }

    /// The activity feed sized by the configured `history_limit`.
    pub fn recent_activity(&self) -> Result<Vec<ChangeRecord>> {
        self.change_history(self.history_limit)
    }

    /// Field changes, issues and notes of one work order merged into a
    /// single list, newest first.
    pub fn order_timeline(&self, work_order_id: &str) -> Result<Vec<TimelineEntry>> {
        let _span = tracing::info_span!("order_timeline", id = %work_order_id).entered();

        self.db.with_conn(|conn| -> Result<Vec<TimelineEntry>> {
            self.require_work_order(conn, work_order_id)?;
            let mut entries = Vec::new();

            for change in history_repo::list_for_work_order(conn, work_order_id)? {
                let h = change.history;
                let kind = if self.catalog.contains(&h.field) {
                    TimelineKind::Date
                } else {
                    TimelineKind::Status
                };
                entries.push(TimelineEntry {
                    kind,
                    timestamp: parse_timestamp("work_order_history", "changed_at", &h.changed_at)?,
                    description: format!(
                        "{}: {}",
                        h.field,
                        h.new_value.as_deref().unwrap_or_default()
                    ),
                    old_value: h.old_value,
                    new_value: h.new_value,
                    user_email: change.email,
                });
            }

            for issue in issue_repo::list_for_work_order(conn, work_order_id)? {
                entries.push(TimelineEntry {
                    kind: TimelineKind::Issue,
                    timestamp: parse_timestamp("issues", "created_at", &issue.created_at)?,
                    description: format!("Nuevo problema: {}", issue.title),
                    old_value: None,
                    new_value: None,
                    user_email: None,
                });
            }

            for (note, email) in issue_repo::notes_for_work_order(conn, work_order_id)? {
                entries.push(TimelineEntry {
                    kind: TimelineKind::Note,
                    timestamp: parse_timestamp("issue_notes", "created_at", &note.created_at)?,
                    description: note.content,
                    old_value: None,
                    new_value: None,
                    user_email: email,
                });
            }

            entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            Ok(entries)
        })
    }
}

fn change_record(row: ChangeRow) -> std::result::Result<ChangeRecord, DatabaseError> {
    let h = row.history;
    Ok(ChangeRecord {
        changed_at: parse_timestamp("work_order_history", "changed_at", &h.changed_at)?,
        work_order_id: h.work_order_id,
        ot: row.ot,
        field: h.field,
        old_value: h.old_value,
        new_value: h.new_value,
        email: row.email,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::auth::Role;
    use crate::model::NewWorkOrder;
    use crate::store::WorkOrderStore;

    use super::*;

    fn store_with_order() -> (WorkOrderStore, crate::auth::Actor, String) {
        let store = WorkOrderStore::open_in_memory().unwrap();
        let actor = store
            .register_user("planta@example.com", Role::Operator)
            .unwrap();
        let wo = store
            .create_work_order(
                &actor,
                NewWorkOrder {
                    ot: "1001".to_string(),
                    client: "ACME".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        (store, actor, wo.id)
    }

    #[test]
    fn test_change_history_hides_derived_fields() {
        let (store, actor, id) = store_with_order();
        store
            .update_work_order_date(
                &actor,
                "1001",
                "Recepción",
                NaiveDate::from_ymd_opt(2026, 3, 1),
                true,
            )
            .unwrap();
        store.toggle_priority(&actor, &id).unwrap();

        let changes = store.change_history(50).unwrap();
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert!(fields.contains(&"Recepción"));
        assert!(fields.contains(&"priority"));
        assert!(!fields.contains(&"status"));
        assert!(!fields.contains(&"progress"));
        assert!(changes.iter().all(|c| c.ot == "1001"));
        assert!(changes
            .iter()
            .all(|c| c.email.as_deref() == Some("planta@example.com")));

        assert_eq!(store.change_history(1).unwrap().len(), 1);
    }

    #[test]
    fn test_recent_activity_uses_history_limit() {
        let (store, actor, id) = store_with_order();
        let store = store.with_history_limit(2);
        for _ in 0..3 {
            store.toggle_priority(&actor, &id).unwrap();
        }
        assert_eq!(store.recent_activity().unwrap().len(), 2);
    }

    #[test]
    fn test_timeline_merges_all_sources() {
        let (store, actor, id) = store_with_order();
        store
            .update_work_order_date(
                &actor,
                "1001",
                "Recepción",
                NaiveDate::from_ymd_opt(2026, 3, 1),
                true,
            )
            .unwrap();
        let issue = store
            .open_issue(&actor, &id, "Desarme", "Pieza rota", None)
            .unwrap();
        store
            .add_issue_note(&actor, issue.id, "Pedido al proveedor")
            .unwrap();

        let timeline = store.order_timeline(&id).unwrap();
        let kinds: Vec<TimelineKind> = timeline.iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&TimelineKind::Date));
        assert!(kinds.contains(&TimelineKind::Status));
        assert!(kinds.contains(&TimelineKind::Issue));
        assert!(kinds.contains(&TimelineKind::Note));

        let issue_entry = timeline
            .iter()
            .find(|e| e.kind == TimelineKind::Issue)
            .unwrap();
        assert_eq!(issue_entry.description, "Nuevo problema: Pieza rota");

        let date_entry = timeline
            .iter()
            .find(|e| e.kind == TimelineKind::Date)
            .unwrap();
        assert_eq!(date_entry.description, "Recepción: 2026-03-01 (confirmada)");
        assert_eq!(date_entry.user_email.as_deref(), Some("planta@example.com"));

        assert!(timeline
            .windows(2)
            .all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_timeline_of_unknown_order() {
        let (store, _, _) = store_with_order();
        assert!(store.order_timeline("missing").is_err());
    }
}

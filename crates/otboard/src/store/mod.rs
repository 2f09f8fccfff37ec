//! Work order store.
//!
//! Every write runs inside one SQLite transaction and is announced on the
//! change feed once it has committed. Status, progress and location are never
//! written directly: they are derived by the `StageResolver` after each stage
//! date write.

mod history;
mod issues;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use tracing::{debug, info, info_span, warn};

use crate::auth::{self, Actor, Capability, Role};
use crate::broadcast::{ChangeEvent, ChangeFeed};
use crate::config::Config;
use crate::db::history_repo::{self, HistoryRow};
use crate::db::stage_date_repo::{self, StageDateRow};
use crate::db::work_order_repo::{self, StatusChange, WorkOrderRow};
use crate::db::{format_date, format_timestamp, Database, DatabaseError};
use crate::error::{ConfigError, Result, WorkOrderError};
use crate::model::{stage_marks, Board, NewWorkOrder, WorkOrder};
use crate::resolver::{Resolution, StageResolver, StageWrite};
use crate::stages::{Location, StageCatalog, NOT_STARTED};

/// Handle to the work order data. Cloning is cheap.
#[derive(Clone)]
pub struct WorkOrderStore {
    db: Database,
    catalog: Arc<StageCatalog>,
    feed: ChangeFeed,
    /// Default size of the activity feed.
    history_limit: u32,
}

const DEFAULT_HISTORY_LIMIT: u32 = 50;

impl WorkOrderStore {
    pub fn new(db: Database, catalog: StageCatalog, feed: ChangeFeed) -> Self {
        Self {
            db,
            catalog: Arc::new(catalog),
            feed,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Opens the configured database and builds a store around it.
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config
            .resolved_database_path()
            .ok_or_else(|| ConfigError::Validation {
                message: "no database_path given and the home directory is unknown".to_string(),
            })?;
        let db = Database::open(&path)?;
        Ok(Self::new(
            db,
            config.stage_catalog(),
            ChangeFeed::new(config.change_feed_capacity),
        )
        .with_history_limit(config.history_limit))
    }

    /// In-memory store with the default stage catalog.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(
            Database::open_in_memory()?,
            StageCatalog::default(),
            ChangeFeed::default(),
        ))
    }

    /// A handle on the same data whose writes are not published.
    pub(crate) fn detached(&self) -> Self {
        Self {
            db: self.db.clone(),
            catalog: Arc::clone(&self.catalog),
            feed: ChangeFeed::new(1),
            history_limit: self.history_limit,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub fn actor(&self, user_id: &str) -> Result<Actor> {
        self.db.with_conn(|conn| Actor::resolve(conn, user_id))
    }

    pub fn register_user(&self, email: &str, role: Role) -> Result<Actor> {
        self.db.with_conn(|conn| auth::register_user(conn, email, role))
    }

    /// Creates a work order in the INCO pipeline with no dates.
    pub fn create_work_order(&self, actor: &Actor, new: NewWorkOrder) -> Result<WorkOrder> {
        let ot = new.ot.trim();
        if ot.is_empty() {
            return Err(WorkOrderError::InvalidField {
                field: "ot",
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        let _span = info_span!("create_work_order", ot = %ot).entered();

        let now = format_timestamp(Utc::now());
        let row = WorkOrderRow {
            id: uuid::Uuid::new_v4().to_string(),
            ot: ot.to_string(),
            client: new.client.trim().to_string(),
            description: new.description,
            tag: new.tag.trim().to_string(),
            location: Location::Inco.as_str().to_string(),
            status: NOT_STARTED.to_string(),
            progress: 0,
            priority: false,
            created_at: now.clone(),
            updated_at: now,
            created_by: Some(actor.id.clone()),
            updated_by: Some(actor.id.clone()),
        };

        self.db.with_conn(|conn| -> Result<()> {
            if work_order_repo::find_by_ot(conn, &row.ot)?.is_some() {
                return Err(WorkOrderError::DuplicateOt(row.ot.clone()).into());
            }
            work_order_repo::insert(conn, &row)?;
            Ok(())
        })?;

        info!(id = %row.id, "Created work order OT {}", row.ot);
        self.feed.publish(ChangeEvent::created(&row.id, &row.ot));
        Ok(WorkOrder::from_rows(&row, &[])?)
    }

    /// Writes the date of one stage and re-derives status, progress and
    /// location from the full set of dates.
    ///
    /// Passing `date: None` unschedules the stage. A confirmed stage must
    /// carry a date: `confirmed` with `date: None` is rejected with
    /// `WorkOrderError::InvalidField` before anything is written, so a stage
    /// without a date never counts towards status or progress. Archived
    /// orders can only be edited by actors holding
    /// `Capability::EditArchivedDates`, and even then their status stays
    /// frozen.
    pub fn update_work_order_date(
        &self,
        actor: &Actor,
        ot: &str,
        stage: &str,
        date: Option<NaiveDate>,
        confirmed: bool,
    ) -> Result<WorkOrder> {
        let _span =
            info_span!("update_work_order_date", ot = %ot, stage = %stage, confirmed).entered();

        if !self.catalog.contains(stage) {
            return Err(WorkOrderError::UnknownStage(stage.to_string()).into());
        }
        if confirmed && date.is_none() {
            return Err(WorkOrderError::InvalidField {
                field: "date",
                reason: format!("stage '{}' cannot be confirmed without a date", stage),
            }
            .into());
        }
        let date = date.map(format_date);

        let updated = self.db.with_conn(|conn| -> Result<WorkOrder> {
            let tx = conn.unchecked_transaction()?;

            let row = work_order_repo::find_by_ot(&tx, ot)?
                .ok_or_else(|| WorkOrderError::NotFound(ot.to_string()))?;
            let pipeline = stored_location(&row);
            if pipeline == Some(Location::Archived) {
                actor.require(Capability::EditArchivedDates)?;
            }

            let now = format_timestamp(Utc::now());
            let previous = stage_date_repo::find(&tx, &row.id, stage)?;
            stage_date_repo::upsert(
                &tx,
                &row.id,
                stage,
                date.as_deref(),
                confirmed,
                &now,
                &actor.id,
            )?;

            let old_value = previous
                .as_ref()
                .and_then(|p| stage_value(p.date.as_deref(), p.confirmed));
            let new_value = stage_value(date.as_deref(), confirmed);
            if old_value != new_value {
                record_change(&tx, &row.id, stage, old_value, new_value, &now, &actor.id)?;
            }

            let dates = stage_date_repo::list_for_work_order(&tx, &row.id)?;
            let resolution = StageResolver::new(&self.catalog).resolve(
                &stage_marks(&dates),
                pipeline,
                &StageWrite::new(stage, confirmed),
            );
            apply_resolution(&tx, &row, &resolution, &now, &actor.id)?;

            let refreshed = work_order_repo::find_by_id(&tx, &row.id)?
                .ok_or_else(|| WorkOrderError::NotFoundById(row.id.clone()))?;
            tx.commit()?;
            Ok(WorkOrder::from_rows(&refreshed, &dates)?)
        })?;

        self.feed.publish(ChangeEvent::updated(&updated.id, &updated.ot));
        Ok(updated)
    }

    pub fn toggle_priority(&self, actor: &Actor, work_order_id: &str) -> Result<WorkOrder> {
        let _span = info_span!("toggle_priority", id = %work_order_id).entered();

        let updated = self.db.with_conn(|conn| -> Result<WorkOrder> {
            let tx = conn.unchecked_transaction()?;
            let row = work_order_repo::find_by_id(&tx, work_order_id)?
                .ok_or_else(|| WorkOrderError::NotFoundById(work_order_id.to_string()))?;

            let now = format_timestamp(Utc::now());
            let priority = !row.priority;
            work_order_repo::set_priority(&tx, &row.id, priority, &now, &actor.id)?;
            record_change(
                &tx,
                &row.id,
                "priority",
                Some(row.priority.to_string()),
                Some(priority.to_string()),
                &now,
                &actor.id,
            )?;

            let refreshed = work_order_repo::find_by_id(&tx, &row.id)?
                .ok_or_else(|| WorkOrderError::NotFoundById(row.id.clone()))?;
            let dates = stage_date_repo::list_for_work_order(&tx, &row.id)?;
            tx.commit()?;
            Ok(WorkOrder::from_rows(&refreshed, &dates)?)
        })?;

        debug!("OT {} priority is now {}", updated.ot, updated.priority);
        self.feed.publish(ChangeEvent::updated(&updated.id, &updated.ot));
        Ok(updated)
    }

    pub fn find_by_ot(&self, ot: &str) -> Result<Option<WorkOrder>> {
        self.db.with_conn(|conn| -> Result<Option<WorkOrder>> {
            let row = work_order_repo::find_by_ot(conn, ot)?;
            row.map(|r| load_work_order(conn, &r)).transpose()
        })
    }

    pub fn find_by_id(&self, work_order_id: &str) -> Result<Option<WorkOrder>> {
        self.db.with_conn(|conn| -> Result<Option<WorkOrder>> {
            let row = work_order_repo::find_by_id(conn, work_order_id)?;
            row.map(|r| load_work_order(conn, &r)).transpose()
        })
    }

    /// Loads every work order split by pipeline, newest first.
    pub fn load_board(&self) -> Result<Board> {
        let _span = info_span!("load_board").entered();

        self.db.with_conn(|conn| -> Result<Board> {
            let rows = work_order_repo::list_all(conn)?;
            let mut dates: HashMap<String, Vec<StageDateRow>> = HashMap::new();
            for date in stage_date_repo::list_all(conn)? {
                dates.entry(date.work_order_id.clone()).or_default().push(date);
            }

            let mut board = Board::default();
            for row in &rows {
                let wo_dates = dates.get(&row.id).map(Vec::as_slice).unwrap_or(&[]);
                let wo = WorkOrder::from_rows(row, wo_dates)?;
                match wo.location {
                    Some(Location::Inco) => board.inco.push(wo),
                    Some(Location::Anti) => board.anti.push(wo),
                    Some(Location::Archived) => board.archived.push(wo),
                    // Not shown on any list until a stage write repairs it.
                    None => warn!("Skipping OT {} with location '{}'", row.ot, row.location),
                }
            }
            debug!(
                inco = board.inco.len(),
                anti = board.anti.len(),
                archived = board.archived.len(),
                "Board loaded"
            );
            Ok(board)
        })
    }

    fn require_work_order(&self, conn: &Connection, work_order_id: &str) -> Result<WorkOrderRow> {
        Ok(work_order_repo::find_by_id(conn, work_order_id)?
            .ok_or_else(|| WorkOrderError::NotFoundById(work_order_id.to_string()))?)
    }
}

fn load_work_order(conn: &Connection, row: &WorkOrderRow) -> Result<WorkOrder> {
    let dates = stage_date_repo::list_for_work_order(conn, &row.id)?;
    Ok(WorkOrder::from_rows(row, &dates)?)
}

fn stored_location(row: &WorkOrderRow) -> Option<Location> {
    match row.location.parse() {
        Ok(location) => Some(location),
        Err(e) => {
            warn!("OT {}: {}, scanning both pipelines", row.ot, e);
            None
        }
    }
}

/// History value of a stage date, e.g. `2026-01-05` or `2026-01-05 (confirmada)`.
fn stage_value(date: Option<&str>, confirmed: bool) -> Option<String> {
    date.map(|d| {
        if confirmed {
            format!("{} (confirmada)", d)
        } else {
            d.to_string()
        }
    })
}

fn record_change(
    conn: &Connection,
    work_order_id: &str,
    field: &str,
    old_value: Option<String>,
    new_value: Option<String>,
    now: &str,
    user_id: &str,
) -> std::result::Result<(), DatabaseError> {
    history_repo::insert(
        conn,
        &HistoryRow {
            id: 0,
            work_order_id: work_order_id.to_string(),
            field: field.to_string(),
            old_value,
            new_value,
            changed_at: now.to_string(),
            changed_by: Some(user_id.to_string()),
        },
    )?;
    Ok(())
}

fn apply_resolution(
    conn: &Connection,
    row: &WorkOrderRow,
    resolution: &Resolution,
    now: &str,
    user_id: &str,
) -> std::result::Result<(), DatabaseError> {
    let update = match resolution {
        Resolution::Advance(update) => update,
        Resolution::ArchivedTouch | Resolution::NoConfirmedStage => {
            debug!("OT {}: {:?}, touching audit fields only", row.ot, resolution);
            return work_order_repo::touch(conn, &row.id, now, user_id);
        }
    };

    let progress = i64::from(update.progress);
    work_order_repo::update_status(
        conn,
        &row.id,
        &StatusChange {
            status: &update.status,
            progress,
            location: update.location.map(|l| l.as_str()),
            updated_at: now,
            updated_by: user_id,
        },
    )?;

    if update.status != row.status {
        record_change(
            conn,
            &row.id,
            "status",
            Some(row.status.clone()),
            Some(update.status.clone()),
            now,
            user_id,
        )?;
    }
    if progress != row.progress {
        record_change(
            conn,
            &row.id,
            "progress",
            Some(row.progress.to_string()),
            Some(progress.to_string()),
            now,
            user_id,
        )?;
    }
    if let Some(location) = update.location {
        if location.as_str() != row.location {
            info!("OT {} moved from {} to {}", row.ot, row.location, location);
            record_change(
                conn,
                &row.id,
                "location",
                Some(row.location.clone()),
                Some(location.as_str().to_string()),
                now,
                user_id,
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::ChangeKind;
    use crate::error::{AuthError, OtboardError};

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2026, 3, d)
    }

    fn setup() -> (WorkOrderStore, Actor, Actor) {
        let store = WorkOrderStore::open_in_memory().unwrap();
        let admin = store.register_user("jefe@example.com", Role::Admin).unwrap();
        let operator = store
            .register_user("planta@example.com", Role::Operator)
            .unwrap();
        (store, admin, operator)
    }

    fn new_order(ot: &str) -> NewWorkOrder {
        NewWorkOrder {
            ot: ot.to_string(),
            client: "Minera Norte".to_string(),
            tag: "P-101".to_string(),
            description: "Bomba centrífuga".to_string(),
        }
    }

    fn confirm_all(store: &WorkOrderStore, actor: &Actor, ot: &str, stages: &[&str]) -> WorkOrder {
        let mut last = None;
        for (i, stage) in stages.iter().enumerate() {
            last = Some(
                store
                    .update_work_order_date(actor, ot, stage, day(i as u32 + 1), true)
                    .unwrap(),
            );
        }
        last.unwrap()
    }

    #[test]
    fn test_create_work_order() {
        let (store, _, operator) = setup();
        let wo = store.create_work_order(&operator, new_order(" 1001 ")).unwrap();

        assert_eq!(wo.ot, "1001");
        assert_eq!(wo.location, Some(Location::Inco));
        assert_eq!(wo.status, NOT_STARTED);
        assert_eq!(wo.progress, 0);
        assert!(wo.dates.is_empty());
        assert_eq!(wo.created_by.as_deref(), Some(operator.id.as_str()));
    }

    #[test]
    fn test_create_rejects_duplicate_and_empty_ot() {
        let (store, _, operator) = setup();
        store.create_work_order(&operator, new_order("1001")).unwrap();

        let err = store
            .create_work_order(&operator, new_order("1001"))
            .unwrap_err();
        assert!(matches!(err, OtboardError::WorkOrder(WorkOrderError::DuplicateOt(_))));

        let err = store.create_work_order(&operator, new_order("  ")).unwrap_err();
        assert!(matches!(
            err,
            OtboardError::WorkOrder(WorkOrderError::InvalidField { field: "ot", .. })
        ));
    }

    #[test]
    fn test_confirmed_stage_sets_status_and_progress() {
        let (store, _, operator) = setup();
        store.create_work_order(&operator, new_order("1001")).unwrap();

        let wo = store
            .update_work_order_date(&operator, "1001", "Recepción", day(2), true)
            .unwrap();
        assert_eq!(wo.status, "Recepción");
        assert_eq!(wo.progress, 5);
        assert_eq!(wo.location, Some(Location::Inco));
        assert_eq!(wo.date_of("Recepción"), day(2));

        // A planned date does not move the status.
        let wo = store
            .update_work_order_date(&operator, "1001", "Desarme", day(4), false)
            .unwrap();
        assert_eq!(wo.status, "Recepción");
        assert!(!wo.is_confirmed("Desarme"));
        assert_eq!(wo.dates.len(), 2);
    }

    #[test]
    fn test_out_of_order_confirmation_keeps_highest_stage() {
        let (store, _, operator) = setup();
        store.create_work_order(&operator, new_order("1001")).unwrap();

        store
            .update_work_order_date(&operator, "1001", "Presupuesto", day(5), true)
            .unwrap();
        let wo = store
            .update_work_order_date(&operator, "1001", "Recepción", day(1), true)
            .unwrap();
        assert_eq!(wo.status, "Presupuesto");
        assert_eq!(wo.progress, 35);
    }

    #[test]
    fn test_full_lifecycle_reaches_archive() {
        let (store, _, operator) = setup();
        store.create_work_order(&operator, new_order("1001")).unwrap();

        let wo = confirm_all(&store, &operator, "1001", &["Recepción", "Desarme", "Anticorr"]);
        assert_eq!(wo.location, Some(Location::Anti));
        assert_eq!(wo.status, "Anticorr");
        assert_eq!(wo.progress, 50);

        // In ANTI only the ANTI sequence counts.
        let wo = store
            .update_work_order_date(&operator, "1001", "Arenado", day(10), true)
            .unwrap();
        assert_eq!(wo.status, "Arenado");
        assert_eq!(wo.progress, 60);

        // Planning the dispatch does not archive.
        let wo = store
            .update_work_order_date(&operator, "1001", "Despacho", day(20), false)
            .unwrap();
        assert_eq!(wo.location, Some(Location::Anti));

        let wo = store
            .update_work_order_date(&operator, "1001", "Despacho", day(20), true)
            .unwrap();
        assert_eq!(wo.location, Some(Location::Archived));
        assert_eq!(wo.status, "Despacho");
        assert_eq!(wo.progress, 100);
    }

    #[test]
    fn test_archived_orders_are_frozen() {
        let (store, admin, operator) = setup();
        store.create_work_order(&operator, new_order("1001")).unwrap();
        confirm_all(&store, &operator, "1001", &["Anticorr"]);
        let archived = confirm_all(&store, &operator, "1001", &["Despacho"]);
        assert_eq!(archived.location, Some(Location::Archived));

        let err = store
            .update_work_order_date(&operator, "1001", "Pintura", day(25), true)
            .unwrap_err();
        assert!(matches!(err, OtboardError::Auth(AuthError::Forbidden { .. })));

        let wo = store
            .update_work_order_date(&admin, "1001", "Pintura", day(25), true)
            .unwrap();
        assert_eq!(wo.location, Some(Location::Archived));
        assert_eq!(wo.status, "Despacho");
        assert_eq!(wo.progress, 100);
        assert!(wo.is_confirmed("Pintura"));
        assert_eq!(wo.updated_by.as_deref(), Some(admin.id.as_str()));
    }

    #[test]
    fn test_no_confirmed_stage_only_touches() {
        let (store, _, operator) = setup();
        let created = store.create_work_order(&operator, new_order("1001")).unwrap();

        let wo = store
            .update_work_order_date(&operator, "1001", "Recepción", day(3), false)
            .unwrap();
        assert_eq!(wo.status, NOT_STARTED);
        assert_eq!(wo.progress, 0);
        assert_eq!(wo.location, Some(Location::Inco));
        assert!(wo.updated_at >= created.updated_at);
    }

    #[test]
    fn test_unconfirming_recomputes_from_remaining_dates() {
        let (store, _, operator) = setup();
        store.create_work_order(&operator, new_order("1001")).unwrap();
        confirm_all(&store, &operator, "1001", &["Recepción", "Desarme"]);

        let wo = store
            .update_work_order_date(&operator, "1001", "Desarme", day(2), false)
            .unwrap();
        assert_eq!(wo.status, "Recepción");
        assert_eq!(wo.progress, 5);
    }

    #[test]
    fn test_unrecognized_location_scans_both_pipelines() {
        let (store, _, operator) = setup();
        let wo = store.create_work_order(&operator, new_order("1001")).unwrap();
        store
            .database()
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE work_orders SET location = 'TALLER' WHERE id = ?1",
                    rusqlite::params![wo.id],
                )?;
                Ok::<_, DatabaseError>(())
            })
            .unwrap();

        let wo = store
            .update_work_order_date(&operator, "1001", "Arenado", day(3), true)
            .unwrap();
        assert_eq!(wo.status, "Arenado");
        assert_eq!(wo.progress, 60);
        assert_eq!(wo.location, None);
        assert!(store.load_board().unwrap().is_empty());
    }

    #[test]
    fn test_update_validates_input() {
        let (store, _, operator) = setup();
        store.create_work_order(&operator, new_order("1001")).unwrap();

        let err = store
            .update_work_order_date(&operator, "9999", "Recepción", day(1), true)
            .unwrap_err();
        assert!(matches!(err, OtboardError::WorkOrder(WorkOrderError::NotFound(_))));

        let err = store
            .update_work_order_date(&operator, "1001", "Soldadura", day(1), true)
            .unwrap_err();
        assert!(matches!(err, OtboardError::WorkOrder(WorkOrderError::UnknownStage(_))));

        let err = store
            .update_work_order_date(&operator, "1001", "Recepción", None, true)
            .unwrap_err();
        assert!(matches!(
            err,
            OtboardError::WorkOrder(WorkOrderError::InvalidField { field: "date", .. })
        ));
    }

    #[test]
    fn test_stage_write_records_history() {
        let (store, _, operator) = setup();
        let wo = store.create_work_order(&operator, new_order("1001")).unwrap();
        store
            .update_work_order_date(&operator, "1001", "Recepción", day(2), true)
            .unwrap();
        // Writing the same value again adds no stage row.
        store
            .update_work_order_date(&operator, "1001", "Recepción", day(2), true)
            .unwrap();

        let rows = store
            .database()
            .with_conn(|conn| history_repo::list_for_work_order(conn, &wo.id))
            .unwrap();
        let fields: Vec<&str> = rows.iter().map(|r| r.history.field.as_str()).collect();
        assert_eq!(fields.iter().filter(|f| **f == "Recepción").count(), 1);
        assert!(fields.contains(&"status"));
        assert!(fields.contains(&"progress"));

        let stage_row = rows
            .iter()
            .find(|r| r.history.field == "Recepción")
            .unwrap();
        assert_eq!(
            stage_row.history.new_value.as_deref(),
            Some("2026-03-02 (confirmada)")
        );
        assert_eq!(stage_row.email.as_deref(), Some("planta@example.com"));
    }

    #[test]
    fn test_toggle_priority() {
        let (store, _, operator) = setup();
        let wo = store.create_work_order(&operator, new_order("1001")).unwrap();

        let wo = store.toggle_priority(&operator, &wo.id).unwrap();
        assert!(wo.priority);
        let wo = store.toggle_priority(&operator, &wo.id).unwrap();
        assert!(!wo.priority);

        let err = store.toggle_priority(&operator, "missing").unwrap_err();
        assert!(matches!(err, OtboardError::WorkOrder(WorkOrderError::NotFoundById(_))));
    }

    #[test]
    fn test_load_board_splits_by_location() {
        let (store, _, operator) = setup();
        for ot in ["1001", "1002", "1003"] {
            store.create_work_order(&operator, new_order(ot)).unwrap();
        }
        confirm_all(&store, &operator, "1002", &["Anticorr"]);
        confirm_all(&store, &operator, "1003", &["Anticorr"]);
        confirm_all(&store, &operator, "1003", &["Despacho"]);

        let board = store.load_board().unwrap();
        assert_eq!(board.len(), 3);
        assert_eq!(board.inco[0].ot, "1001");
        assert_eq!(board.anti[0].ot, "1002");
        assert_eq!(board.archived[0].ot, "1003");
        assert!(board.archived[0].is_confirmed("Despacho"));
    }

    #[test]
    fn test_find_by_ot_and_id() {
        let (store, _, operator) = setup();
        let wo = store.create_work_order(&operator, new_order("1001")).unwrap();

        assert_eq!(store.find_by_ot("1001").unwrap().unwrap().id, wo.id);
        assert_eq!(store.find_by_id(&wo.id).unwrap().unwrap().ot, "1001");
        assert!(store.find_by_ot("9999").unwrap().is_none());
    }

    #[test]
    fn test_writes_are_published() {
        let (store, _, operator) = setup();
        let mut rx = store.feed().subscribe();

        let wo = store.create_work_order(&operator, new_order("1001")).unwrap();
        store
            .update_work_order_date(&operator, "1001", "Recepción", day(1), true)
            .unwrap();
        store.toggle_priority(&operator, &wo.id).unwrap();

        let kinds: Vec<ChangeKind> = (0..3).map(|_| rx.try_recv().unwrap().kind).collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::Created, ChangeKind::Updated, ChangeKind::Updated]
        );
    }

    #[test]
    fn test_failed_write_is_not_published() {
        let (store, _, operator) = setup();
        let mut rx = store.feed().subscribe();

        let _ = store.update_work_order_date(&operator, "9999", "Recepción", day(1), true);
        assert!(rx.try_recv().is_err());
    }
}

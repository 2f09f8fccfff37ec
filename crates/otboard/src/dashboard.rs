//! Summary figures shown above the board.

use serde::Serialize;

use crate::model::{Board, WorkOrder};
use crate::stages::{Location, StageCatalog};

/// Where an active work order currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStage {
    pub work_order_id: String,
    pub ot: String,
    pub client: String,
    pub stage: String,
    pub priority: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total: usize,
    /// Orders in INCO or ANTI.
    pub in_progress: usize,
    /// Archived orders.
    pub completed: usize,
    /// Active orders flagged as priority.
    pub priority_orders: Vec<OrderStage>,
    /// Average days from the first to the last INCO stage, over INCO orders.
    pub average_days_inco: Option<i64>,
    /// Average days from the first to the last ANTI stage, over ANTI orders.
    pub average_days_anti: Option<i64>,
    /// Average days from the first INCO stage to the last ANTI stage, over
    /// all active orders.
    pub average_days_total: Option<i64>,
    pub current_stages: Vec<OrderStage>,
}

impl DashboardSummary {
    pub fn from_board(board: &Board, catalog: &StageCatalog) -> Self {
        let current_stages: Vec<OrderStage> = board
            .active()
            .map(|wo| order_stage(wo, catalog))
            .collect();
        let priority_orders = current_stages
            .iter()
            .filter(|s| s.priority)
            .cloned()
            .collect();

        Self {
            total: board.len(),
            in_progress: board.inco.len() + board.anti.len(),
            completed: board.archived.len(),
            priority_orders,
            average_days_inco: average_days(
                board.inco.iter(),
                catalog.first_and_last(Some(Location::Inco)),
            ),
            average_days_anti: average_days(
                board.anti.iter(),
                catalog.first_and_last(Some(Location::Anti)),
            ),
            average_days_total: average_days(board.active(), catalog.first_and_last(None)),
            current_stages,
        }
    }
}

fn order_stage(wo: &WorkOrder, catalog: &StageCatalog) -> OrderStage {
    let location = wo.location.unwrap_or(Location::Anti);
    OrderStage {
        work_order_id: wo.id.clone(),
        ot: wo.ot.clone(),
        client: wo.client.clone(),
        stage: catalog
            .current_stage_label(location, |stage| wo.is_confirmed(stage))
            .to_string(),
        priority: wo.priority,
    }
}

/// Mean of `last - first` in days over the orders that have both dates,
/// rounded half up. `None` when no order qualifies.
fn average_days<'a>(
    orders: impl Iterator<Item = &'a WorkOrder>,
    bounds: Option<(&str, &str)>,
) -> Option<i64> {
    let (first, last) = bounds?;
    let spans: Vec<i64> = orders
        .filter_map(|wo| {
            let start = wo.date_of(first)?;
            let end = wo.date_of(last)?;
            Some((end - start).num_days())
        })
        .collect();
    if spans.is_empty() {
        return None;
    }
    let mean = spans.iter().sum::<i64>() as f64 / spans.len() as f64;
    Some((mean + 0.5).floor() as i64)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::model::StageDate;
    use crate::stages::NOT_STARTED;

    fn order(ot: &str, location: Location, dates: &[(&str, u32, bool)]) -> WorkOrder {
        let mut map = BTreeMap::new();
        for (stage, day, confirmed) in dates {
            map.insert(
                stage.to_string(),
                StageDate {
                    date: NaiveDate::from_ymd_opt(2026, 1, *day).unwrap(),
                    confirmed: *confirmed,
                },
            );
        }
        WorkOrder {
            id: format!("wo-{}", ot),
            ot: ot.to_string(),
            client: "ACME".to_string(),
            description: String::new(),
            tag: String::new(),
            location: Some(location),
            status: NOT_STARTED.to_string(),
            progress: 0,
            priority: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: None,
            updated_by: None,
            dates: map,
        }
    }

    #[test]
    fn test_counts_and_priority() {
        let mut urgent = order("1", Location::Inco, &[("Recepción", 1, true)]);
        urgent.priority = true;
        let mut archived = order("3", Location::Archived, &[]);
        archived.priority = true;
        let board = Board {
            inco: vec![urgent],
            anti: vec![order("2", Location::Anti, &[])],
            archived: vec![archived],
        };

        let summary = DashboardSummary::from_board(&board, &StageCatalog::default());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.in_progress, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.priority_orders.len(), 1);
        assert_eq!(summary.priority_orders[0].ot, "1");
        assert_eq!(summary.priority_orders[0].stage, "Recepción");
    }

    #[test]
    fn test_current_stage_labels() {
        let board = Board {
            inco: vec![order(
                "1",
                Location::Inco,
                &[("Recepción", 1, true), ("Desarme", 2, true), ("Inspección", 3, false)],
            )],
            anti: vec![order(
                "2",
                Location::Anti,
                // INCO stages do not count once in ANTI.
                &[("Anticorr", 1, true)],
            )],
            archived: vec![],
        };

        let summary = DashboardSummary::from_board(&board, &StageCatalog::default());
        assert_eq!(summary.current_stages[0].stage, "Desarme");
        assert_eq!(summary.current_stages[1].stage, NOT_STARTED);
    }

    #[test]
    fn test_average_days() {
        let board = Board {
            inco: vec![
                order("1", Location::Inco, &[("Recepción", 1, true), ("Anticorr", 4, true)]),
                order("2", Location::Inco, &[("Recepción", 1, true), ("Anticorr", 5, false)]),
                // Missing the last date, left out.
                order("3", Location::Inco, &[("Recepción", 1, true)]),
            ],
            anti: vec![order(
                "4",
                Location::Anti,
                &[("Recepción", 1, true), ("Arenado", 10, true), ("Despacho", 20, false)],
            )],
            archived: vec![],
        };

        let summary = DashboardSummary::from_board(&board, &StageCatalog::default());
        // (3 + 4) / 2 = 3.5
        assert_eq!(summary.average_days_inco, Some(4));
        assert_eq!(summary.average_days_anti, Some(10));
        assert_eq!(summary.average_days_total, Some(19));
    }

    #[test]
    fn test_average_days_without_data() {
        let summary = DashboardSummary::from_board(&Board::default(), &StageCatalog::default());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_days_inco, None);
        assert_eq!(summary.average_days_anti, None);
        assert_eq!(summary.average_days_total, None);
        assert!(summary.current_stages.is_empty());
    }
}

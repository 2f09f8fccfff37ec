//! Test harness for isolated test execution.
//!
//! The `TestHarness` opens a store on a database file inside a temporary
//! directory and registers one admin and one operator.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDate;
use tempfile::TempDir;

use otboard::{Actor, Config, Role, WorkOrder, WorkOrderStore};

use super::builders::{ConfigBuilder, WorkOrderBuilder};

pub struct TestHarness {
    /// Keeps the database directory alive for the lifetime of the harness.
    temp_dir: TempDir,
    pub db_path: PathBuf,
    pub store: WorkOrderStore,
    pub admin: Actor,
    pub operator: Actor,
}

impl TestHarness {
    /// Create a harness with the default stage catalog.
    pub fn new() -> Self {
        Self::with_config(ConfigBuilder::new())
    }

    /// Create a harness from a config builder. The database path is always
    /// redirected into the temporary directory.
    pub fn with_config(builder: ConfigBuilder) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("data").join("otboard.db");
        let config: Config = builder
            .database_path(db_path.to_str().expect("temp path is not UTF-8"))
            .build();

        let store = WorkOrderStore::from_config(&config).expect("Failed to open store");
        let admin = store
            .register_user("jefe@example.com", Role::Admin)
            .expect("Failed to register admin");
        let operator = store
            .register_user("planta@example.com", Role::Operator)
            .expect("Failed to register operator");

        Self {
            temp_dir,
            db_path,
            store,
            admin,
            operator,
        }
    }

    /// Create a work order as the operator.
    pub fn create(&self, ot: &str) -> WorkOrder {
        self.store
            .create_work_order(&self.operator, WorkOrderBuilder::new(ot).build())
            .expect("Failed to create work order")
    }

    /// Confirm the given stages in order, one day apart starting March 1st.
    pub fn confirm(&self, ot: &str, stages: &[&str]) -> WorkOrder {
        let mut last = None;
        for (i, stage) in stages.iter().enumerate() {
            let date = NaiveDate::from_ymd_opt(2026, 3, 1 + i as u32);
            last = Some(
                self.store
                    .update_work_order_date(&self.operator, ot, stage, date, true)
                    .unwrap_or_else(|e| panic!("Failed to confirm {} on {}: {}", stage, ot, e)),
            );
        }
        last.expect("no stages given")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

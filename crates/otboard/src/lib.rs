pub mod auth;
pub mod backup;
pub mod broadcast;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod model;
pub mod resolver;
pub mod stages;
pub mod store;
pub mod telemetry;

pub use auth::{Actor, Capability, Role};
pub use backup::{create_backup, restore_backup, Backup, RestoreSummary};
pub use broadcast::{BoardCache, ChangeEvent, ChangeFeed, ChangeKind};
pub use config::{load_config, load_config_from_str, Config};
pub use dashboard::DashboardSummary;
pub use db::Database;
pub use error::{
    AuthError, BackupError, ConfigError, OtboardError, Result, TelemetryError, WorkOrderError,
};
pub use model::{Board, ChangeRecord, Issue, NewWorkOrder, TimelineEntry, WorkOrder};
pub use resolver::{Resolution, StageResolver};
pub use stages::{Location, Stage, StageCatalog};
pub use store::WorkOrderStore;

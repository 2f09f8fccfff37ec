use std::path::PathBuf;
use thiserror::Error;

use crate::auth::Capability;

#[derive(Error, Debug)]
pub enum OtboardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Work order error: {0}")]
    WorkOrder(#[from] WorkOrderError),

    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

impl From<rusqlite::Error> for OtboardError {
    fn from(e: rusqlite::Error) -> Self {
        OtboardError::Database(crate::db::DatabaseError::Sqlite(e))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid stage '{name}': {reason}")]
    InvalidStage { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum WorkOrderError {
    #[error("Work order OT {0} not found")]
    NotFound(String),

    #[error("Work order with id '{0}' not found")]
    NotFoundById(String),

    #[error("Work order OT {0} already exists")]
    DuplicateOt(String),

    #[error("Unknown stage '{0}'")]
    UnknownStage(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Issue {0} not found")]
    IssueNotFound(i64),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Unknown user '{0}'")]
    UnknownUser(String),

    #[error("User '{email}' lacks the {capability} capability")]
    Forbidden {
        email: String,
        capability: Capability,
    },
}

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Failed to parse backup: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported backup version {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid backup: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

pub type Result<T> = std::result::Result<T, OtboardError>;

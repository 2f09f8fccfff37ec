use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::stages::{Stage, StageCatalog};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Overrides the default database location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
    #[serde(default = "default_change_feed_capacity")]
    pub change_feed_capacity: usize,
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub stages: StagesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_change_feed_capacity() -> usize {
    256
}

fn default_history_limit() -> u32 {
    50
}

impl Config {
    /// Database path from the config, falling back to `~/.otboard/data/otboard.db`.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        match &self.database_path {
            Some(path) => Some(PathBuf::from(path)),
            None => crate::db::default_database_path(),
        }
    }

    pub fn stage_catalog(&self) -> StageCatalog {
        self.stages.to_catalog()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: None,
            change_feed_capacity: default_change_feed_capacity(),
            history_limit: default_history_limit(),
            logging: LoggingConfig::default(),
            stages: StagesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    pub progress: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagesConfig {
    pub inco: Vec<StageConfig>,
    pub anti: Vec<StageConfig>,
    #[serde(default = "default_handoff_stage")]
    pub handoff_stage: String,
    #[serde(default = "default_dispatch_stage")]
    pub dispatch_stage: String,
}

fn default_handoff_stage() -> String {
    "Anticorr".to_string()
}

fn default_dispatch_stage() -> String {
    "Despacho".to_string()
}

impl StagesConfig {
    pub fn to_catalog(&self) -> StageCatalog {
        let convert = |list: &[StageConfig]| {
            list.iter()
                .map(|s| Stage::new(&s.name, s.progress))
                .collect::<Vec<_>>()
        };
        StageCatalog::new(
            convert(&self.inco),
            convert(&self.anti),
            self.handoff_stage.clone(),
            self.dispatch_stage.clone(),
        )
    }
}

impl Default for StagesConfig {
    fn default() -> Self {
        let catalog = StageCatalog::default();
        let convert = |list: &[Stage]| {
            list.iter()
                .map(|s| StageConfig {
                    name: s.name.clone(),
                    progress: s.progress,
                })
                .collect::<Vec<_>>()
        };
        Self {
            inco: convert(catalog.inco()),
            anti: convert(catalog.anti()),
            handoff_stage: catalog.handoff_stage().to_string(),
            dispatch_stage: catalog.dispatch_stage().to_string(),
        }
    }
}

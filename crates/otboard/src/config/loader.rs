use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::{Config, StageConfig};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    let stages = &config.stages;
    if stages.inco.is_empty() || stages.anti.is_empty() {
        return Err(ConfigError::Validation {
            message: "Both INCO and ANTI stage sequences must be non-empty".to_string(),
        });
    }

    // Stage dates are keyed by name only, so names must be unique across pipelines.
    let mut names = HashSet::new();
    let mut previous: Option<&StageConfig> = None;
    for stage in stages.inco.iter().chain(stages.anti.iter()) {
        if stage.name.trim().is_empty() {
            return Err(ConfigError::InvalidStage {
                name: stage.name.clone(),
                reason: "Stage name must not be blank".to_string(),
            });
        }
        if !names.insert(stage.name.as_str()) {
            return Err(ConfigError::InvalidStage {
                name: stage.name.clone(),
                reason: "Duplicate stage name".to_string(),
            });
        }
        if stage.progress > 100 {
            return Err(ConfigError::InvalidStage {
                name: stage.name.clone(),
                reason: format!("Progress {} is above 100", stage.progress),
            });
        }
        if let Some(prev) = previous {
            if stage.progress < prev.progress {
                return Err(ConfigError::InvalidStage {
                    name: stage.name.clone(),
                    reason: format!(
                        "Progress {} is lower than the preceding stage '{}' ({})",
                        stage.progress, prev.name, prev.progress
                    ),
                });
            }
        }
        previous = Some(stage);
    }

    // INCO orders are only resolved against the INCO sequence.
    if !stages.inco.iter().any(|s| s.name == stages.handoff_stage) {
        return Err(ConfigError::InvalidStage {
            name: stages.handoff_stage.clone(),
            reason: "Handoff stage must belong to the INCO pipeline".to_string(),
        });
    }

    if !stages.anti.iter().any(|s| s.name == stages.dispatch_stage) {
        return Err(ConfigError::InvalidStage {
            name: stages.dispatch_stage.clone(),
            reason: "Dispatch stage must belong to the ANTI pipeline".to_string(),
        });
    }

    Ok(())
}

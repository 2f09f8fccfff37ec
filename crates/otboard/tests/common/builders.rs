//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use otboard::config::{Config, StageConfig, StagesConfig};
use otboard::NewWorkOrder;

/// Builder for creating `Config` instances.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with the default stages.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn database_path(mut self, path: &str) -> Self {
        self.config.database_path = Some(path.to_string());
        self
    }

    pub fn change_feed_capacity(mut self, capacity: usize) -> Self {
        self.config.change_feed_capacity = capacity;
        self
    }

    /// Replace both stage sequences.
    pub fn stages(mut self, inco: &[(&str, u8)], anti: &[(&str, u8)]) -> Self {
        let convert = |list: &[(&str, u8)]| {
            list.iter()
                .map(|(name, progress)| StageConfig {
                    name: name.to_string(),
                    progress: *progress,
                })
                .collect::<Vec<_>>()
        };
        self.config.stages = StagesConfig {
            inco: convert(inco),
            anti: convert(anti),
            ..self.config.stages
        };
        self
    }

    pub fn handoff_stage(mut self, name: &str) -> Self {
        self.config.stages.handoff_stage = name.to_string();
        self
    }

    pub fn dispatch_stage(mut self, name: &str) -> Self {
        self.config.stages.dispatch_stage = name.to_string();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }

    /// Serialize to the JSON accepted by `load_config`.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.config).unwrap()
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating `NewWorkOrder` instances.
pub struct WorkOrderBuilder {
    order: NewWorkOrder,
}

impl WorkOrderBuilder {
    pub fn new(ot: &str) -> Self {
        Self {
            order: NewWorkOrder {
                ot: ot.to_string(),
                client: "Minera Norte".to_string(),
                tag: "P-101".to_string(),
                description: "Bomba centrífuga".to_string(),
            },
        }
    }

    pub fn client(mut self, client: &str) -> Self {
        self.order.client = client.to_string();
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.order.tag = tag.to_string();
        self
    }

    pub fn build(self) -> NewWorkOrder {
        self.order
    }
}

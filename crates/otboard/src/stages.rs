//! Pipeline locations and the ordered stage sequences of each pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status label of a work order with no confirmed stage.
pub const NOT_STARTED: &str = "Sin iniciar";

/// Where a work order currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Location {
    Inco,
    Anti,
    Archived,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Inco => "INCO",
            Location::Anti => "ANTI",
            Location::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored location string is not one of the known pipelines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized location '{0}'")]
pub struct UnknownLocation(pub String);

impl FromStr for Location {
    type Err = UnknownLocation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCO" => Ok(Location::Inco),
            "ANTI" => Ok(Location::Anti),
            "ARCHIVED" => Ok(Location::Archived),
            other => Err(UnknownLocation(other.to_string())),
        }
    }
}

/// A named checkpoint and the progress percentage reached when it is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub progress: u8,
}

impl Stage {
    pub fn new(name: &str, progress: u8) -> Self {
        Self {
            name: name.to_string(),
            progress,
        }
    }
}

/// The static stage configuration of both pipelines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCatalog {
    inco: Vec<Stage>,
    anti: Vec<Stage>,
    /// Confirming this stage moves an INCO order to ANTI.
    handoff_stage: String,
    /// Confirming this stage archives an ANTI order.
    dispatch_stage: String,
    /// INCO followed by ANTI, used for archived or unrecognized pipelines.
    combined: Vec<Stage>,
}

impl StageCatalog {
    pub fn new(
        inco: Vec<Stage>,
        anti: Vec<Stage>,
        handoff_stage: impl Into<String>,
        dispatch_stage: impl Into<String>,
    ) -> Self {
        let combined = inco.iter().chain(anti.iter()).cloned().collect();
        Self {
            inco,
            anti,
            handoff_stage: handoff_stage.into(),
            dispatch_stage: dispatch_stage.into(),
            combined,
        }
    }

    pub fn inco(&self) -> &[Stage] {
        &self.inco
    }

    pub fn anti(&self) -> &[Stage] {
        &self.anti
    }

    pub fn handoff_stage(&self) -> &str {
        &self.handoff_stage
    }

    pub fn dispatch_stage(&self) -> &str {
        &self.dispatch_stage
    }

    /// Returns the ordered sequence scanned for a pipeline.
    ///
    /// Anything other than INCO or ANTI (archived orders and unrecognized
    /// locations) spans both sequences, INCO first.
    pub fn sequence_for(&self, location: Option<Location>) -> &[Stage] {
        match location {
            Some(Location::Inco) => &self.inco,
            Some(Location::Anti) => &self.anti,
            _ => &self.combined,
        }
    }

    /// Looks up a stage by name in either pipeline.
    pub fn find(&self, name: &str) -> Option<&Stage> {
        self.combined.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// First and last stage names of the sequence for `location`.
    pub fn first_and_last(&self, location: Option<Location>) -> Option<(&str, &str)> {
        let seq = self.sequence_for(location);
        match (seq.first(), seq.last()) {
            (Some(first), Some(last)) => Some((first.name.as_str(), last.name.as_str())),
            _ => None,
        }
    }

    /// Display label of the stage a work order is currently at.
    ///
    /// INCO orders are read against the INCO sequence, every other order
    /// against the ANTI sequence.
    pub fn current_stage_label<'a, F>(&'a self, location: Location, is_confirmed: F) -> &'a str
    where
        F: Fn(&str) -> bool,
    {
        let seq = match location {
            Location::Inco => &self.inco,
            _ => &self.anti,
        };
        seq.iter()
            .filter(|s| is_confirmed(&s.name))
            .last()
            .map(|s| s.name.as_str())
            .unwrap_or(NOT_STARTED)
    }
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self::new(
            vec![
                Stage::new("Recepción", 5),
                Stage::new("Desarme", 15),
                Stage::new("Inspección", 25),
                Stage::new("Presupuesto", 35),
                Stage::new("Reparación", 45),
                Stage::new("Anticorr", 50),
            ],
            vec![
                Stage::new("Arenado", 60),
                Stage::new("Imprimación", 70),
                Stage::new("Pintura", 85),
                Stage::new("Control final", 95),
                Stage::new("Despacho", 100),
            ],
            "Anticorr",
            "Despacho",
        )
    }
}

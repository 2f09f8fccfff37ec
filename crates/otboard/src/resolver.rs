//! Stage transition resolver.
//!
//! Derives the status, progress and pipeline location of a work order from
//! the complete set of its stage dates. The result depends only on which
//! stages are confirmed, never on the order they were written in, so the
//! resolver can be re-run after every write.

use crate::stages::{Location, Stage, StageCatalog};

/// The part of a stage date the resolver looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageMark {
    pub stage: String,
    pub confirmed: bool,
}

impl StageMark {
    pub fn new(stage: &str, confirmed: bool) -> Self {
        Self {
            stage: stage.to_string(),
            confirmed,
        }
    }
}

/// The stage date write that triggered a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageWrite {
    pub stage: String,
    pub confirmed: bool,
}

impl StageWrite {
    pub fn new(stage: &str, confirmed: bool) -> Self {
        Self {
            stage: stage.to_string(),
            confirmed,
        }
    }
}

/// Fields written back to the work order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: String,
    pub progress: u8,
    /// `None` when the input pipeline was unrecognized: the stored value is kept.
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Archived orders are frozen; only the audit fields are touched.
    ArchivedTouch,
    /// Nothing is confirmed, so status, progress and location stay as they are.
    NoConfirmedStage,
    Advance(StatusUpdate),
}

impl Resolution {
    pub fn update(&self) -> Option<&StatusUpdate> {
        match self {
            Resolution::Advance(update) => Some(update),
            _ => None,
        }
    }
}

pub struct StageResolver<'a> {
    catalog: &'a StageCatalog,
}

impl<'a> StageResolver<'a> {
    pub fn new(catalog: &'a StageCatalog) -> Self {
        Self { catalog }
    }

    /// Returns the highest-ordinal stage of the pipeline's sequence that has
    /// a confirmed date.
    pub fn last_confirmed_stage(
        &self,
        dates: &[StageMark],
        pipeline: Option<Location>,
    ) -> Option<&'a Stage> {
        let mut current = None;
        for stage in self.catalog.sequence_for(pipeline) {
            if is_confirmed(dates, &stage.name) {
                current = Some(stage);
            }
        }
        current
    }

    /// Computes the post-write state of a work order.
    ///
    /// `pipeline` is the location before the write; `None` stands for a
    /// stored location that is not one of the known pipelines.
    pub fn resolve(
        &self,
        dates: &[StageMark],
        pipeline: Option<Location>,
        write: &StageWrite,
    ) -> Resolution {
        if pipeline == Some(Location::Archived) {
            return Resolution::ArchivedTouch;
        }

        let last = match self.last_confirmed_stage(dates, pipeline) {
            Some(stage) => stage,
            None => return Resolution::NoConfirmedStage,
        };

        let location = match pipeline {
            Some(Location::Inco) if is_confirmed(dates, self.catalog.handoff_stage()) => {
                Some(Location::Anti)
            }
            Some(Location::Anti)
                if write.confirmed && write.stage == self.catalog.dispatch_stage() =>
            {
                Some(Location::Archived)
            }
            other => other,
        };

        Resolution::Advance(StatusUpdate {
            status: last.name.clone(),
            progress: last.progress,
            location,
        })
    }
}

fn is_confirmed(dates: &[StageMark], stage: &str) -> bool {
    dates.iter().any(|d| d.confirmed && d.stage == stage)
}

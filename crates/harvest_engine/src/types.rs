use std::path::PathBuf;
use std::time::Duration;

use harvest_core::{Record, RunSummary};
use thiserror::Error;

use crate::driver::DriverError;

/// Errors that end a whole run. Item-scoped failures never surface here; the
/// orchestrator folds them into the run state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{what} did not render within {waited:?}")]
    StructuralNotReady { what: String, waited: Duration },
    #[error("driver failure: {0}")]
    Driver(#[from] DriverError),
}

/// How an inner harvest loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestEnd {
    /// A history-start notice was found.
    ReachedStart,
    /// The per-item budget ran out; the records must be discarded.
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOutcome {
    pub records: Vec<Record>,
    pub end: HarvestEnd,
    pub iterations: usize,
    pub load_more_clicks: usize,
    pub stagnation_resets: usize,
    pub elapsed: Duration,
}

impl HarvestOutcome {
    pub fn timed_out(&self) -> bool {
        self.end == HarvestEnd::TimedOut
    }
}

/// Result of one outer pagination round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Round {
    /// Labels not processed before, in rendering order.
    Fresh(Vec<String>),
    /// Nothing new even after advancing the list once.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    /// No records were accumulated, so nothing was written.
    Skipped,
    Written(PathBuf),
    Failed(String),
}

/// What a run hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub records: Vec<Record>,
    pub processed: Vec<String>,
    pub timed_out: Vec<String>,
    pub errored: Vec<(String, String)>,
    pub summary: RunSummary,
    pub persisted: PersistStatus,
    /// The error that aborted traversal, if any. Records gathered before it are
    /// still in `records` and were handed to the sink.
    pub fatal: Option<EngineError>,
}

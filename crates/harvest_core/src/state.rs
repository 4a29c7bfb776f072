use std::collections::HashSet;
use std::time::Duration;

use crate::summary::RunSummary;
use crate::{normalize_label, ExclusionSet, Record};

/// Count- and time-based limits for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLimits {
    /// Maximum number of successfully harvested (non-excluded, non-timed-out) items.
    pub quota: usize,
    /// Maximum number of outer pagination rounds.
    pub max_rounds: usize,
    /// Wall-clock allowance for a single item's harvest.
    pub per_item_budget: Duration,
    /// Optional wall-clock allowance for the whole traversal.
    pub deadline: Option<Duration>,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            quota: 350,
            max_rounds: 80,
            per_item_budget: Duration::from_secs(40),
            deadline: None,
        }
    }
}

/// Why a run stopped traversing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    QuotaReached,
    Exhausted,
    RoundLimit,
    DeadlineReached,
    /// Global setup failed; the run could not continue.
    Fatal,
}

/// How one visited outer item ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Harvested(Vec<Record>),
    /// Budget exceeded; `collected` records were seen and thrown away.
    TimedOut { collected: usize },
    Failed(String),
}

impl ItemOutcome {
    pub fn record_count(&self) -> usize {
        match self {
            ItemOutcome::Harvested(records) => records.len(),
            ItemOutcome::TimedOut { .. } | ItemOutcome::Failed(_) => 0,
        }
    }
}

/// State of one run. Owned by the orchestrator and only changed through
/// [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    quota: usize,
    exclusions: ExclusionSet,
    /// Normalized labels; `processed_order` keeps the rendering first seen.
    processed: HashSet<String>,
    processed_order: Vec<String>,
    accumulated: Vec<Record>,
    quota_used: usize,
    rounds: usize,
    excluded: Vec<String>,
    timed_out: Vec<String>,
    errored: Vec<(String, String)>,
    stop_reason: Option<StopReason>,
}

impl RunState {
    pub fn new(quota: usize, exclusions: ExclusionSet) -> Self {
        Self {
            quota,
            exclusions,
            ..Self::default()
        }
    }

    /// True when `label`, in any spacing or case, was already settled.
    pub fn is_processed(&self, label: &str) -> bool {
        self.processed.contains(&normalize_label(label))
    }

    /// Labels from `visible` that have not been processed yet, in order.
    pub fn unprocessed(&self, visible: &[String]) -> Vec<String> {
        visible
            .iter()
            .filter(|label| !self.is_processed(label))
            .cloned()
            .collect()
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    pub fn quota_used(&self) -> usize {
        self.quota_used
    }

    pub fn quota_reached(&self) -> bool {
        self.quota_used >= self.quota
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn records(&self) -> &[Record] {
        &self.accumulated
    }

    pub fn processed_labels(&self) -> &[String] {
        &self.processed_order
    }

    pub fn timed_out_labels(&self) -> &[String] {
        &self.timed_out
    }

    pub fn errored_labels(&self) -> &[(String, String)] {
        &self.errored
    }

    pub fn excluded_labels(&self) -> &[String] {
        &self.excluded
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            processed: self.processed_order.len(),
            records: self.accumulated.len(),
            quota_used: self.quota_used,
            quota: self.quota,
            rounds: self.rounds,
            excluded: self.excluded.len(),
            timed_out: self.timed_out.clone(),
            errored: self.errored.clone(),
            stop_reason: self.stop_reason,
        }
    }

    pub(crate) fn is_excluded(&self, label: &str) -> bool {
        self.exclusions.is_excluded(label)
    }

    pub(crate) fn start_round(&mut self) {
        self.rounds += 1;
    }

    pub(crate) fn mark_processed(&mut self, label: &str) -> bool {
        if self.processed.insert(normalize_label(label)) {
            self.processed_order.push(label.to_string());
            true
        } else {
            false
        }
    }

    pub(crate) fn mark_excluded(&mut self, label: &str) {
        if self.mark_processed(label) {
            self.excluded.push(label.to_string());
        }
    }

    pub(crate) fn apply_outcome(&mut self, label: &str, outcome: ItemOutcome) {
        if !self.mark_processed(label) {
            return;
        }
        match outcome {
            ItemOutcome::Harvested(records) => {
                self.accumulated.extend(records);
                self.quota_used += 1;
            }
            ItemOutcome::TimedOut { .. } => self.timed_out.push(label.to_string()),
            ItemOutcome::Failed(reason) => self.errored.push((label.to_string(), reason)),
        }
    }

    pub(crate) fn stop(&mut self, reason: StopReason) {
        if self.stop_reason.is_none() {
            self.stop_reason = Some(reason);
        }
    }
}

use crate::StopReason;

/// Counters and label lists reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Items added to the processed set, skips included.
    pub processed: usize,
    pub records: usize,
    pub quota_used: usize,
    pub quota: usize,
    pub rounds: usize,
    pub excluded: usize,
    pub timed_out: Vec<String>,
    /// `(label, reason)` pairs.
    pub errored: Vec<(String, String)>,
    pub stop_reason: Option<StopReason>,
}

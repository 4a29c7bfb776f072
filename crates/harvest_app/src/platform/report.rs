use std::fmt::Write;

use harvest_core::StopReason;
use harvest_engine::{PersistStatus, RunReport};

fn describe(reason: Option<StopReason>) -> &'static str {
    match reason {
        Some(StopReason::QuotaReached) => "conversation quota reached",
        Some(StopReason::Exhausted) => "no more conversations in the list",
        Some(StopReason::RoundLimit) => "round limit reached",
        Some(StopReason::DeadlineReached) => "run deadline reached",
        Some(StopReason::Fatal) => "aborted on error",
        None => "unknown",
    }
}

/// Human-readable end-of-run summary.
pub fn render(report: &RunReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();
    let finished = chrono::Local::now().format("%Y-%m-%d %H:%M");
    let _ = writeln!(out, "===== Harvest finished {finished} =====");
    let _ = writeln!(out, "Stopped: {}", describe(summary.stop_reason));
    if let Some(err) = &report.fatal {
        let _ = writeln!(out, "Error: {err}");
    }
    let _ = writeln!(out, "Conversations processed (skips included): {}", summary.processed);
    let _ = writeln!(out, "Harvested: {}/{}", summary.quota_used, summary.quota);
    let _ = writeln!(out, "Records: {}", summary.records);
    let _ = writeln!(out, "Rounds: {}", summary.rounds);
    let _ = writeln!(out, "Excluded: {}", summary.excluded);
    let _ = writeln!(out, "Timed out: {}", summary.timed_out.len());
    for (index, label) in summary.timed_out.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", index + 1, label);
    }
    let _ = writeln!(out, "Errors: {}", summary.errored.len());
    for (label, reason) in &summary.errored {
        let _ = writeln!(out, "  - {label}: {reason}");
    }
    match &report.persisted {
        PersistStatus::Written(path) => {
            let _ = writeln!(out, "Output: {}", path.display());
        }
        PersistStatus::Skipped => {
            let _ = writeln!(out, "Output: nothing written, no messages were collected");
        }
        PersistStatus::Failed(err) => {
            let _ = writeln!(out, "Output: write failed: {err}");
        }
    }
    out
}

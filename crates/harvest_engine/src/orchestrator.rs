use std::time::Duration;

use harvest_core::{
    date_span, update, Effect, ExclusionSet, ItemOutcome, Msg, RunLimits, RunState, StopReason,
};
use harvest_logging::{harvest_error, harvest_info, harvest_warn};

use crate::clock::Clock;
use crate::driver::UiDriver;
use crate::export::RecordSink;
use crate::harvest::{HarvestSettings, ItemHarvester};
use crate::pagination::{OuterPager, PagerSettings};
use crate::selectors::Selectors;
use crate::{EngineError, PersistStatus, Round, RunReport};

/// Everything a run needs besides the driver, clock and sink.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunConfig {
    pub limits: RunLimits,
    pub exclusions: ExclusionSet,
    pub pager: PagerSettings,
    pub harvest: HarvestSettings,
    pub selectors: Selectors,
    /// Destination name handed to the sink.
    pub output_name: String,
}

/// Drives one run: pages through the outer list, harvests each admitted item in
/// discovery order and persists what was accumulated.
pub struct Orchestrator<'a> {
    driver: &'a dyn UiDriver,
    clock: &'a dyn Clock,
    config: RunConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(driver: &'a dyn UiDriver, clock: &'a dyn Clock, config: RunConfig) -> Self {
        Self {
            driver,
            clock,
            config,
        }
    }

    /// Runs to a stop condition, then hands the records to `sink` if there are any.
    ///
    /// Persistence is attempted even when traversal ended on a fatal error; that
    /// error comes back in [`RunReport::fatal`] next to the counts gathered so far.
    pub async fn run(&self, sink: &dyn RecordSink) -> RunReport {
        let mut state = RunState::new(self.config.limits.quota, self.config.exclusions.clone());
        let (reason, fatal) = match self.traverse(&mut state).await {
            Ok(reason) => (reason, None),
            Err(err) => {
                harvest_error!("run aborted: {}", err);
                (StopReason::Fatal, Some(err))
            }
        };
        harvest_info!("traversal stopped: {:?}", reason);

        let mut persisted = PersistStatus::Skipped;
        for effect in dispatch(&mut state, Msg::Stopped(reason)) {
            if effect == Effect::Persist {
                persisted = persist(sink, &self.config.output_name, &state);
            }
        }
        if persisted == PersistStatus::Skipped {
            harvest_warn!("no messages were collected; nothing written");
        }

        RunReport {
            records: state.records().to_vec(),
            processed: state.processed_labels().to_vec(),
            timed_out: state.timed_out_labels().to_vec(),
            errored: state.errored_labels().to_vec(),
            summary: state.summary(),
            persisted,
            fatal,
        }
    }

    async fn traverse(&self, state: &mut RunState) -> Result<StopReason, EngineError> {
        let pager = OuterPager::new(
            self.driver,
            self.clock,
            &self.config.selectors,
            &self.config.pager,
        );
        let started = self.clock.now();
        let limits = &self.config.limits;

        for _ in 0..limits.max_rounds {
            if self.deadline_passed(started) {
                return Ok(StopReason::DeadlineReached);
            }
            let labels = match pager.next_round(state).await? {
                Round::Fresh(labels) => labels,
                Round::Exhausted => return Ok(StopReason::Exhausted),
            };

            for effect in dispatch(state, Msg::RoundListed { labels }) {
                let Effect::Harvest { label } = effect else {
                    continue;
                };
                if state.quota_reached() {
                    harvest_info!("quota of {} conversations reached", limits.quota);
                    return Ok(StopReason::QuotaReached);
                }
                let Some(budget) = self.item_budget(started) else {
                    return Ok(StopReason::DeadlineReached);
                };
                let outcome = self.visit(&pager, &label, budget).await;
                dispatch(state, Msg::ItemFinished { label, outcome });
                harvest_info!(
                    "progress: {}/{} harvested, {} records, {} timed out, {} failed",
                    state.quota_used(),
                    limits.quota,
                    state.records().len(),
                    state.timed_out_labels().len(),
                    state.errored_labels().len()
                );
            }

            if state.quota_reached() {
                harvest_info!("quota of {} conversations reached", limits.quota);
                return Ok(StopReason::QuotaReached);
            }
            pager.advance().await?;
        }

        harvest_info!("round limit of {} reached", limits.max_rounds);
        Ok(StopReason::RoundLimit)
    }

    /// Opens and harvests one item. Never fails: problems become the outcome.
    async fn visit(&self, pager: &OuterPager<'_>, label: &str, budget: Duration) -> ItemOutcome {
        let _scope = harvest_logging::enter_item(label);
        harvest_info!("opening conversation");
        if let Err(err) = pager.open(label).await {
            harvest_warn!("could not open conversation: {}", err);
            return ItemOutcome::Failed(err.to_string());
        }

        let harvester = ItemHarvester::new(
            self.driver,
            self.clock,
            &self.config.selectors,
            &self.config.harvest,
        );
        match harvester.harvest(label, budget).await {
            Ok(outcome) if outcome.timed_out() => {
                harvest_warn!("skipped after {:?}; nothing from it is kept", outcome.elapsed);
                ItemOutcome::TimedOut {
                    collected: outcome.records.len(),
                }
            }
            Ok(outcome) => {
                match date_span(&outcome.records) {
                    Some((oldest, newest)) => harvest_info!(
                        "{} messages from {} to {}",
                        outcome.records.len(),
                        oldest,
                        newest
                    ),
                    None => harvest_info!("{} messages", outcome.records.len()),
                }
                ItemOutcome::Harvested(outcome.records)
            }
            Err(err) => {
                harvest_warn!("harvest failed: {}", err);
                ItemOutcome::Failed(err.to_string())
            }
        }
    }

    fn deadline_passed(&self, started: Duration) -> bool {
        self.config
            .limits
            .deadline
            .is_some_and(|deadline| self.clock.elapsed_since(started) >= deadline)
    }

    /// Per-item budget, shortened to whatever is left of the run deadline.
    /// `None` once the deadline has passed.
    fn item_budget(&self, started: Duration) -> Option<Duration> {
        let per_item = self.config.limits.per_item_budget;
        match self.config.limits.deadline {
            None => Some(per_item),
            Some(deadline) => {
                let left = deadline.checked_sub(self.clock.elapsed_since(started))?;
                (!left.is_zero()).then(|| per_item.min(left))
            }
        }
    }
}

fn dispatch(state: &mut RunState, msg: Msg) -> Vec<Effect> {
    let (next, effects) = update(std::mem::take(state), msg);
    *state = next;
    effects
}

fn persist(sink: &dyn RecordSink, output_name: &str, state: &RunState) -> PersistStatus {
    match sink.persist(output_name, state.records()) {
        Ok(path) => {
            harvest_info!("wrote {} records to {:?}", state.records().len(), path);
            PersistStatus::Written(path)
        }
        Err(err) => {
            harvest_error!("failed to write records: {}", err);
            PersistStatus::Failed(err.to_string())
        }
    }
}

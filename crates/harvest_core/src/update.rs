use std::collections::HashSet;

use crate::{normalize_label, Effect, Msg, RunState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    let effects = match msg {
        Msg::RoundListed { labels } => {
            state.start_round();
            let mut effects = Vec::with_capacity(labels.len());
            let mut queued = HashSet::new();
            for label in labels {
                if state.is_processed(&label) {
                    continue;
                }
                // Excluded labels are settled here so later rounds never look at them again.
                if state.is_excluded(&label) {
                    state.mark_excluded(&label);
                    continue;
                }
                if queued.insert(normalize_label(&label)) {
                    effects.push(Effect::Harvest { label });
                }
            }
            effects
        }
        Msg::ItemFinished { label, outcome } => {
            state.apply_outcome(&label, outcome);
            Vec::new()
        }
        Msg::Stopped(reason) => {
            state.stop(reason);
            if state.records().is_empty() {
                Vec::new()
            } else {
                vec![Effect::Persist]
            }
        }
    };

    (state, effects)
}

//! Harvest core: pure run state machine, label rules and record identity.
mod effect;
mod label;
mod meta;
mod msg;
mod record;
mod state;
mod summary;
mod update;

pub use effect::Effect;
pub use label::{normalize_label, ExclusionSet, LabelRules};
pub use meta::{date_span, parse_meta_date};
pub use msg::Msg;
pub use record::{
    literal_key, media_key, row_preview, MediaKind, Record, RecordSet, MEDIA_PREVIEW_CHARS,
};
pub use state::{ItemOutcome, RunLimits, RunState, StopReason};
pub use summary::RunSummary;
pub use update::update;

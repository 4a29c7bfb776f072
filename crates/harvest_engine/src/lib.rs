//! Harvest engine: drives a remote two-level list UI through a [`UiDriver`] and
//! turns what it renders into records.
mod classify;
mod clock;
mod driver;
mod export;
mod filename;
mod harvest;
mod orchestrator;
mod pagination;
mod scroll;
mod selectors;
mod types;
mod wait;

pub use classify::{classify_row, row_meta};
pub use clock::{Clock, ManualClock, TokioClock};
pub use driver::{DriverError, ElementHandle, Locator, ScrollMetrics, UiDriver};
pub use export::{render_csv, CsvRecordSink, PersistError, RecordSink, CSV_HEADERS};
pub use filename::{output_filename, profile_dir_name};
pub use harvest::{HarvestSettings, ItemHarvester};
pub use orchestrator::{Orchestrator, RunConfig};
pub use pagination::{OuterPager, PagerSettings};
pub use scroll::{ScrollBounds, ScrollDecision};
pub use selectors::Selectors;
pub use types::{EngineError, HarvestEnd, HarvestOutcome, PersistStatus, Round, RunReport};
pub use wait::{wait_for_all, wait_for_first, POLL_INTERVAL};

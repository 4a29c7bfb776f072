use crate::{ItemOutcome, StopReason};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The outer pager produced the labels of a new round, in rendering order.
    RoundListed { labels: Vec<String> },
    /// An opened item finished harvesting, timed out or failed.
    ItemFinished { label: String, outcome: ItemOutcome },
    /// Traversal ended.
    Stopped(StopReason),
}

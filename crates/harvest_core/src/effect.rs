#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the labelled outer item and harvest it.
    Harvest { label: String },
    /// Hand the accumulated records to the persistence sink.
    Persist,
}

use crate::{CycleId, GatewayFailure, IdeaRecord, RelayMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Popup triggered a new cycle for the page at `url`.
    ExtractionRequested { cycle: CycleId, url: String },
    /// A relay message addressed to the coordinator, from the popup or the page-context extractor.
    Received(RelayMessage),
    /// Gateway finished the outbound call for a cycle.
    GatewayCompleted {
        cycle: CycleId,
        result: Result<Vec<IdeaRecord>, GatewayFailure>,
    },
    /// Popup asked to abandon a cycle.
    CancelRequested { cycle: CycleId },
    /// Fallback for placeholder wiring.
    NoOp,
}

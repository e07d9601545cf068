use crate::{CycleId, GenerationRequest, RelayMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RunExtractor { cycle: CycleId, url: String },
    SubmitGeneration {
        cycle: CycleId,
        request: GenerationRequest,
    },
    AbortSubmission { cycle: CycleId },
    NotifyPopup(RelayMessage),
}

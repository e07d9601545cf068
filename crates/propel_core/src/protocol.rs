use serde::{Deserialize, Serialize};

use crate::{CycleId, IdeaRecord};

/// Messages exchanged between the popup, the coordinator, and the page-context extractor.
///
/// Every variant carries the cycle id chosen when the popup triggered the cycle, so a
/// receiver can drop messages that belong to a stale or overlapping cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RelayMessage {
    /// Popup -> coordinator -> extractor: extract the page at `url`.
    InitiateExtraction { cycle: CycleId, url: String },
    /// Extractor -> coordinator.
    ProcessPageContent {
        cycle: CycleId,
        url: String,
        #[serde(rename = "textContent")]
        text_content: String,
    },
    /// Extractor -> coordinator.
    ContentExtractionFailure {
        cycle: CycleId,
        url: String,
        message: String,
    },
    /// Popup -> coordinator: abandon the cycle.
    CancelCycle { cycle: CycleId },
    /// Coordinator -> popup, optimistic progress.
    ProcessingStart { cycle: CycleId, message: String },
    /// Coordinator -> popup, terminal.
    DisplayIdeas {
        cycle: CycleId,
        ideas: Vec<IdeaRecord>,
    },
    /// Coordinator -> popup, terminal.
    DisplayError { cycle: CycleId, message: String },
}

impl RelayMessage {
    pub fn cycle(&self) -> CycleId {
        match self {
            RelayMessage::InitiateExtraction { cycle, .. }
            | RelayMessage::ProcessPageContent { cycle, .. }
            | RelayMessage::ContentExtractionFailure { cycle, .. }
            | RelayMessage::CancelCycle { cycle }
            | RelayMessage::ProcessingStart { cycle, .. }
            | RelayMessage::DisplayIdeas { cycle, .. }
            | RelayMessage::DisplayError { cycle, .. } => *cycle,
        }
    }

    /// True for the two messages that end a cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RelayMessage::DisplayIdeas { .. } | RelayMessage::DisplayError { .. }
        )
    }

    pub fn action(&self) -> &'static str {
        match self {
            RelayMessage::InitiateExtraction { .. } => "initiate_extraction",
            RelayMessage::ProcessPageContent { .. } => "process_page_content",
            RelayMessage::ContentExtractionFailure { .. } => "content_extraction_failure",
            RelayMessage::CancelCycle { .. } => "cancel_cycle",
            RelayMessage::ProcessingStart { .. } => "processing_start",
            RelayMessage::DisplayIdeas { .. } => "display_ideas",
            RelayMessage::DisplayError { .. } => "display_error",
        }
    }
}

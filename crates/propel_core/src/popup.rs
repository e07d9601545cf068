use propel_logging::propel_debug;

use crate::view_model::{PopupStatus, PopupViewModel};
use crate::{CycleId, IdeaRecord, RelayMessage};

pub const NO_IDEAS_MESSAGE: &str =
    "No ideas generated. Try a different page or check the API logs.";

/// Popup-side rendering state. Holds only what the relay messages dictate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopupState {
    next_cycle: CycleId,
    current: Option<CycleId>,
    status: PopupStatus,
    ideas: Vec<IdeaRecord>,
    dirty: bool,
}

impl PopupState {
    pub fn new() -> Self {
        Self::default()
    }

    fn in_flight(&self) -> bool {
        matches!(
            self.status,
            PopupStatus::Requested | PopupStatus::Processing { .. }
        )
    }

    /// User pressed the trigger. Returns the message that opens a new cycle, or `None`
    /// while the trigger is disabled.
    pub fn trigger(&mut self, url: impl Into<String>) -> Option<RelayMessage> {
        if self.in_flight() {
            return None;
        }
        self.next_cycle += 1;
        let cycle = self.next_cycle;
        self.current = Some(cycle);
        self.status = PopupStatus::Requested;
        self.ideas.clear();
        self.dirty = true;
        Some(RelayMessage::InitiateExtraction {
            cycle,
            url: url.into(),
        })
    }

    /// User asked to abandon the running cycle.
    pub fn cancel(&self) -> Option<RelayMessage> {
        match self.current {
            Some(cycle) if self.in_flight() => Some(RelayMessage::CancelCycle { cycle }),
            _ => None,
        }
    }

    /// Applies a coordinator message. Messages for any cycle but the current one are ignored.
    pub fn receive(&mut self, message: &RelayMessage) {
        if Some(message.cycle()) != self.current || !self.in_flight() {
            propel_debug!(
                "popup ignoring {} for cycle {}",
                message.action(),
                message.cycle()
            );
            return;
        }
        match message {
            RelayMessage::ProcessingStart { message, .. } => {
                self.status = PopupStatus::Processing {
                    message: message.clone(),
                };
            }
            RelayMessage::DisplayIdeas { ideas, .. } if ideas.is_empty() => {
                self.status = PopupStatus::Error {
                    message: NO_IDEAS_MESSAGE.to_string(),
                };
            }
            RelayMessage::DisplayIdeas { ideas, .. } => {
                self.ideas = ideas.clone();
                self.status = PopupStatus::Ideas;
            }
            RelayMessage::DisplayError { message, .. } => {
                self.status = PopupStatus::Error {
                    message: message.clone(),
                };
            }
            _ => return,
        }
        self.dirty = true;
    }

    pub fn current_cycle(&self) -> Option<CycleId> {
        self.current
    }

    pub fn view(&self) -> PopupViewModel {
        PopupViewModel {
            status: self.status.clone(),
            trigger_enabled: !self.in_flight(),
            ideas: self.ideas.clone(),
            cycle: self.current,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

use crate::{CycleId, IdeaRecord};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PopupStatus {
    #[default]
    Ready,
    /// Trigger sent, nothing heard back yet.
    Requested,
    Processing { message: String },
    Ideas,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopupViewModel {
    pub status: PopupStatus,
    pub trigger_enabled: bool,
    pub ideas: Vec<IdeaRecord>,
    pub cycle: Option<CycleId>,
}

impl PopupViewModel {
    /// True once the popup shows a result or an error for its cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, PopupStatus::Ideas | PopupStatus::Error { .. })
    }
}

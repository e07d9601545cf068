use std::collections::BTreeMap;

use crate::{CycleId, PLACEHOLDER_USER_ID};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleStage {
    /// Waiting for the extractor's single outcome message.
    Extracting { url: String },
    /// Outbound generation call in flight.
    Submitting { url: String },
}

/// Coordinator bookkeeping: only cycles that have not yet produced a terminal message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorState {
    user_id: String,
    cycles: BTreeMap<CycleId, CycleStage>,
    terminal_sent: u64,
}

impl Default for CoordinatorState {
    fn default() -> Self {
        Self::new(PLACEHOLDER_USER_ID)
    }
}

impl CoordinatorState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            cycles: BTreeMap::new(),
            terminal_sent: 0,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn stage(&self, cycle: CycleId) -> Option<&CycleStage> {
        self.cycles.get(&cycle)
    }

    /// In-flight cycles in ascending id order.
    pub fn in_flight(&self) -> Vec<CycleId> {
        self.cycles.keys().copied().collect()
    }

    pub fn is_idle(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Number of terminal messages emitted since creation.
    pub fn terminal_count(&self) -> u64 {
        self.terminal_sent
    }

    pub(crate) fn begin(&mut self, cycle: CycleId, url: String) -> bool {
        if self.cycles.contains_key(&cycle) {
            return false;
        }
        self.cycles.insert(cycle, CycleStage::Extracting { url });
        true
    }

    pub(crate) fn advance_to_submitting(&mut self, cycle: CycleId) {
        if let Some(CycleStage::Extracting { url }) = self.cycles.get(&cycle) {
            let url = url.clone();
            self.cycles.insert(cycle, CycleStage::Submitting { url });
        }
    }

    /// Removes the cycle; the caller emits its terminal message.
    pub(crate) fn finish(&mut self, cycle: CycleId) -> Option<CycleStage> {
        let stage = self.cycles.remove(&cycle);
        if stage.is_some() {
            self.terminal_sent += 1;
        }
        stage
    }
}

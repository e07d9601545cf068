//! Propel core: data model, relay wire protocol, and the pure coordinator/popup state machines.
mod effect;
mod msg;
mod popup;
mod protocol;
mod state;
mod types;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use popup::{PopupState, NO_IDEAS_MESSAGE};
pub use protocol::RelayMessage;
pub use state::{CoordinatorState, CycleStage};
pub use types::{
    normalize_whitespace, CycleId, ExtractionFailure, ExtractionFailureReason, ExtractionResult,
    GatewayFailure, GenerationRequest, IdeaRecord, RequestError, CONNECTIVITY_MESSAGE,
    MIN_CONTENT_CHARS, PLACEHOLDER_USER_ID,
};
pub use update::{update, CANCELLED_MESSAGE, PROCESSING_MESSAGE};
pub use view_model::{PopupStatus, PopupViewModel};

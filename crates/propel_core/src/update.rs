use propel_logging::{enter_cycle, propel_debug, propel_info, propel_warn};

use crate::{
    CoordinatorState, CycleId, CycleStage, Effect, GenerationRequest, Msg, RelayMessage,
};

/// Progress text sent to the popup once a submission starts.
pub const PROCESSING_MESSAGE: &str = "Analyzing page content...";
/// Terminal text for a cycle the user abandoned.
pub const CANCELLED_MESSAGE: &str = "Request cancelled.";

/// Pure coordinator update: applies a message to state and returns any effects.
///
/// Every cycle that enters the state leaves it through exactly one `NotifyPopup` carrying a
/// terminal message. Messages for cycles that are unknown or already finished are dropped.
pub fn update(mut state: CoordinatorState, msg: Msg) -> (CoordinatorState, Vec<Effect>) {
    let effects = match msg {
        Msg::ExtractionRequested { cycle, url } => {
            let _cycle = enter_cycle(cycle);
            if state.begin(cycle, url.clone()) {
                propel_info!("extraction requested for {}", url);
                vec![Effect::RunExtractor { cycle, url }]
            } else {
                propel_warn!("duplicate extraction request ignored");
                Vec::new()
            }
        }
        Msg::Received(message) => on_page_message(&mut state, message),
        Msg::GatewayCompleted { cycle, result } => {
            let _cycle = enter_cycle(cycle);
            match state.stage(cycle) {
                Some(CycleStage::Submitting { .. }) => {
                    state.finish(cycle);
                    let terminal = match result {
                        Ok(ideas) => {
                            propel_info!("gateway returned {} ideas", ideas.len());
                            RelayMessage::DisplayIdeas { cycle, ideas }
                        }
                        Err(failure) => {
                            propel_warn!("gateway failed: {:?}", failure);
                            RelayMessage::DisplayError {
                                cycle,
                                message: failure.user_message(),
                            }
                        }
                    };
                    vec![Effect::NotifyPopup(terminal)]
                }
                _ => {
                    propel_debug!("late gateway result dropped");
                    Vec::new()
                }
            }
        }
        Msg::CancelRequested { cycle } => cancel(&mut state, cycle),
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn on_page_message(state: &mut CoordinatorState, message: RelayMessage) -> Vec<Effect> {
    let cycle = message.cycle();
    let _cycle = enter_cycle(cycle);
    let extracting = matches!(state.stage(cycle), Some(CycleStage::Extracting { .. }));

    match message {
        RelayMessage::ProcessPageContent {
            url, text_content, ..
        } if extracting => {
            match GenerationRequest::new(url, text_content, state.user_id()) {
                Ok(request) => {
                    state.advance_to_submitting(cycle);
                    propel_info!("submitting {} characters", request.text_content.chars().count());
                    vec![
                        Effect::NotifyPopup(RelayMessage::ProcessingStart {
                            cycle,
                            message: PROCESSING_MESSAGE.to_string(),
                        }),
                        Effect::SubmitGeneration { cycle, request },
                    ]
                }
                Err(err) => {
                    propel_warn!("page content rejected: {}", err);
                    state.finish(cycle);
                    vec![Effect::NotifyPopup(RelayMessage::DisplayError {
                        cycle,
                        message: err.to_string(),
                    })]
                }
            }
        }
        RelayMessage::ContentExtractionFailure { url, message, .. } if extracting => {
            propel_warn!("content extraction failed for {}: {}", url, message);
            state.finish(cycle);
            vec![Effect::NotifyPopup(RelayMessage::DisplayError { cycle, message })]
        }
        RelayMessage::InitiateExtraction { url, .. } => {
            if state.begin(cycle, url.clone()) {
                vec![Effect::RunExtractor { cycle, url }]
            } else {
                propel_warn!("duplicate extraction request ignored");
                Vec::new()
            }
        }
        RelayMessage::CancelCycle { .. } => cancel(state, cycle),
        other => {
            propel_warn!("dropping {} outside of its cycle stage", other.action());
            Vec::new()
        }
    }
}

fn cancel(state: &mut CoordinatorState, cycle: CycleId) -> Vec<Effect> {
    let _cycle = enter_cycle(cycle);
    let Some(stage) = state.finish(cycle) else {
        propel_debug!("cancel for finished cycle ignored");
        return Vec::new();
    };
    propel_info!("cycle cancelled");
    let mut effects = Vec::with_capacity(2);
    if matches!(stage, CycleStage::Submitting { .. }) {
        effects.push(Effect::AbortSubmission { cycle });
    }
    effects.push(Effect::NotifyPopup(RelayMessage::DisplayError {
        cycle,
        message: CANCELLED_MESSAGE.to_string(),
    }));
    effects
}

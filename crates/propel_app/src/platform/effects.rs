use std::time::Duration;

use propel_core::{Effect, GatewayFailure, Msg, RelayMessage};
use propel_engine::{EngineEvent, EngineHandle};
use propel_logging::{propel_info, propel_warn};

/// Hands coordinator effects to the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Executes engine-bound effects. Returns the messages addressed to the popup, in order.
    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<RelayMessage> {
        let mut to_popup = Vec::new();
        for effect in effects {
            match effect {
                Effect::RunExtractor { cycle, url } => {
                    propel_info!("RunExtractor cycle={} url={}", cycle, url);
                    self.engine.extract(cycle, url);
                }
                Effect::SubmitGeneration { cycle, request } => {
                    propel_info!(
                        "SubmitGeneration cycle={} url={} text_chars={}",
                        cycle,
                        request.url,
                        request.text_content.chars().count()
                    );
                    self.engine.submit(cycle, request);
                }
                Effect::AbortSubmission { cycle } => {
                    propel_info!("AbortSubmission cycle={}", cycle);
                    self.engine.abort(cycle);
                }
                Effect::NotifyPopup(message) => to_popup.push(message),
            }
        }
        to_popup
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn poll(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(event_to_msg)
    }
}

fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::PageMessage(message) => Msg::Received(message),
        EngineEvent::GatewayCompleted { cycle, result } => Msg::GatewayCompleted {
            cycle,
            result: result.map_err(|err| {
                propel_warn!("Generation for cycle {} failed: {}", cycle, err);
                GatewayFailure::from(&err)
            }),
        },
    }
}

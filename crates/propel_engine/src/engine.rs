use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use propel_core::{CycleId, ExtractionFailure, ExtractionFailureReason, GenerationRequest};
use propel_logging::{enter_cycle, propel_debug, propel_info};
use tokio_util::sync::CancellationToken;

use crate::extract::outcome_message;
use crate::gateway::GatewaySettings;
use crate::{
    ConfigError, CredentialProvider, EngineEvent, Extractor, Gateway, GatewayError, HttpGateway,
    PageLoadError, PageSource, PrioritizedExtractor, PropelConfig, RoutingPageSource,
};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("cannot start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot build page loader: {0}")]
    Pages(#[from] PageLoadError),
    #[error("cannot build gateway: {0}")]
    Gateway(#[from] GatewayError),
}

/// The collaborators the engine drives. Swappable for tests.
pub struct EngineParts {
    pub pages: Arc<dyn PageSource>,
    pub extractor: Arc<dyn Extractor>,
    pub gateway: Arc<dyn Gateway>,
}

impl EngineParts {
    pub fn from_config(
        config: &PropelConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, EngineError> {
        let gateway = HttpGateway::new(GatewaySettings::from_config(config)?, credentials)?;
        Ok(Self {
            pages: Arc::new(RoutingPageSource::new(config.page.clone())?),
            extractor: Arc::new(PrioritizedExtractor::default()),
            gateway: Arc::new(gateway),
        })
    }
}

enum EngineCommand {
    Extract { cycle: CycleId, url: String },
    Submit {
        cycle: CycleId,
        request: GenerationRequest,
    },
    Abort { cycle: CycleId },
}

type Inflight = Arc<Mutex<HashMap<CycleId, CancellationToken>>>;

/// Runs page extraction and gateway calls on a background tokio runtime.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(
        config: &PropelConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, EngineError> {
        Self::with_parts(EngineParts::from_config(config, credentials)?)
    }

    pub fn with_parts(parts: EngineParts) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("propel-engine")
            .build()?;

        thread::spawn(move || {
            let inflight: Inflight = Arc::default();
            while let Ok(command) = cmd_rx.recv() {
                handle_command(&runtime, &parts, &inflight, command, &event_tx);
            }
            propel_debug!("engine command channel closed");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn extract(&self, cycle: CycleId, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Extract {
            cycle,
            url: url.into(),
        });
    }

    pub fn submit(&self, cycle: CycleId, request: GenerationRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Submit { cycle, request });
    }

    /// Abandons an in-flight submission; no event will be sent for it.
    pub fn abort(&self, cycle: CycleId) {
        let _ = self.cmd_tx.send(EngineCommand::Abort { cycle });
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    parts: &EngineParts,
    inflight: &Inflight,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Extract { cycle, url } => {
            let pages = parts.pages.clone();
            let extractor = parts.extractor.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let outcome = match pages.load(&url).await {
                    Ok(page) => extractor.extract(&page),
                    Err(err) => Err(ExtractionFailure {
                        url: url.clone(),
                        reason: ExtractionFailureReason::PageUnavailable(err.to_string()),
                    }),
                };
                let _ = event_tx.send(EngineEvent::PageMessage(outcome_message(cycle, outcome)));
            });
        }
        EngineCommand::Submit { cycle, request } => {
            let token = CancellationToken::new();
            if let Ok(mut map) = inflight.lock() {
                map.insert(cycle, token.clone());
            }
            let gateway = parts.gateway.clone();
            let inflight = inflight.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {
                        let _cycle = enter_cycle(cycle);
                        propel_info!("submission aborted");
                    }
                    result = gateway.generate(&request) => {
                        if let Ok(mut map) = inflight.lock() {
                            map.remove(&cycle);
                        }
                        let _ = event_tx.send(EngineEvent::GatewayCompleted { cycle, result });
                    }
                }
            });
        }
        EngineCommand::Abort { cycle } => {
            let token = inflight.lock().ok().and_then(|mut map| map.remove(&cycle));
            match token {
                Some(token) => token.cancel(),
                None => propel_debug!("abort for cycle {} with nothing in flight", cycle),
            }
        }
    }
}

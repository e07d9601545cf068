use std::collections::VecDeque;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use propel_core::{
    update, CoordinatorState, Msg, PopupState, PopupStatus, PopupViewModel, RelayMessage,
};
use propel_engine::{EngineHandle, PropelConfig, TokenStore};
use propel_logging::{propel_debug, propel_error, propel_info};

use super::cli::{Cli, Command};
use super::effects::EffectRunner;
use super::logging::{self, LogDestination};
use super::render::render_view;
use super::{settings, web};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let destination = if cli.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    logging::initialize(destination, level);

    let result = settings::load(cli.config.as_deref()).and_then(|config| match cli.command {
        Command::Ideas { target } => run_ideas(&config, &target),
        other => web::run(&config, other).map(|()| true),
    });

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            propel_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs one relay cycle against the configured backend. Returns whether ideas were shown.
fn run_ideas(config: &PropelConfig, target: &str) -> Result<bool> {
    let credentials = Arc::new(TokenStore::new(config.token_path.clone()));
    let engine = EngineHandle::new(config, credentials).context("cannot start engine")?;
    let runner = EffectRunner::new(engine);
    let interrupts = watch_interrupts();

    let view = drive_cycle(
        &runner,
        &config.user_id,
        target,
        &interrupts,
        &mut io::stdout(),
    )?;
    Ok(matches!(view.status, PopupStatus::Ideas))
}

/// The popup triggers, the coordinator drives the engine, the popup renders each change.
/// Returns the popup's view once it shows ideas or an error.
fn drive_cycle(
    runner: &EffectRunner,
    user_id: &str,
    target: &str,
    interrupts: &mpsc::Receiver<()>,
    out: &mut impl Write,
) -> Result<PopupViewModel> {
    let mut popup = PopupState::new();
    let mut coordinator = CoordinatorState::new(user_id);
    let mut inbox: VecDeque<Msg> = popup
        .trigger(target)
        .map(Msg::Received)
        .into_iter()
        .collect();

    loop {
        while let Some(msg) = inbox.pop_front() {
            let (next, effects) = update(coordinator, msg);
            coordinator = next;
            for message in runner.enqueue(effects) {
                deliver(&mut popup, &message);
            }
        }

        if popup.consume_dirty() {
            let view = popup.view();
            render_view(&mut *out, &view)?;
            out.flush()?;
            if view.is_terminal() {
                propel_info!(
                    "cycle {:?} finished; in flight: {:?}",
                    popup.current_cycle(),
                    coordinator.in_flight()
                );
                return Ok(view);
            }
        }

        if interrupts.try_recv().is_ok() {
            if let Some(cancel) = popup.cancel() {
                inbox.push_back(Msg::Received(cancel));
                continue;
            }
        }

        if let Some(msg) = runner.poll(POLL_INTERVAL) {
            inbox.push_back(msg);
        }
    }
}

fn deliver(popup: &mut PopupState, message: &RelayMessage) {
    propel_debug!("to popup: {} (cycle {})", message.action(), message.cycle());
    popup.receive(message);
}

/// Forwards Ctrl-C presses. The receiver never yields if the handler could not be installed.
fn watch_interrupts() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                propel_error!("cannot watch for Ctrl-C: {}", err);
                return;
            }
        };
        runtime.block_on(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
    });
    rx
}

#[cfg(test)]
mod tests {
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    use async_trait::async_trait;
    use propel_core::{
        GenerationRequest, IdeaRecord, PopupStatus, CANCELLED_MESSAGE, NO_IDEAS_MESSAGE,
    };
    use propel_engine::{
        EngineHandle, EngineParts, Gateway, GatewayError, PageLoadError, PageSnapshot,
        PageSource, PrioritizedExtractor,
    };

    use super::drive_cycle;
    use crate::platform::effects::EffectRunner;

    const ARTICLE: &str = "https://news.example.com/story";
    const TINY: &str = "https://tiny.example.com/";
    const SLOW: &str = "https://slow.example.com/";

    struct Pages;

    #[async_trait]
    impl PageSource for Pages {
        async fn load(&self, address: &str) -> Result<PageSnapshot, PageLoadError> {
            let html = if address == TINY {
                "<body>hi</body>".to_string()
            } else {
                format!("<body><article>{}</article></body>", "Useful reading. ".repeat(20))
            };
            if address == SLOW {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Ok(PageSnapshot::new(address, html))
        }
    }

    struct Ideas(Vec<IdeaRecord>);

    #[async_trait]
    impl Gateway for Ideas {
        async fn generate(&self, _: &GenerationRequest) -> Result<Vec<IdeaRecord>, GatewayError> {
            Ok(self.0.clone())
        }
    }

    fn runner(ideas: Vec<IdeaRecord>) -> EffectRunner {
        let engine = EngineHandle::with_parts(EngineParts {
            pages: Arc::new(Pages),
            extractor: Arc::new(PrioritizedExtractor::default()),
            gateway: Arc::new(Ideas(ideas)),
        })
        .unwrap();
        EffectRunner::new(engine)
    }

    fn idea(name: &str) -> IdeaRecord {
        IdeaRecord {
            name: name.to_string(),
            problem: "p".to_string(),
            solution: "s".to_string(),
        }
    }

    fn drive(runner: &EffectRunner, target: &str, interrupted: bool) -> (PopupStatus, String) {
        let (tx, rx) = mpsc::channel();
        if interrupted {
            tx.send(()).unwrap();
        }
        let mut out = Vec::new();
        let view = drive_cycle(runner, "tester", target, &rx, &mut out).unwrap();
        (view.status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn ideas_are_rendered_once_after_progress() {
        let runner = runner(vec![idea("Grid"), idea("Fleet")]);
        let (status, text) = drive(&runner, ARTICLE, false);
        assert_eq!(status, PopupStatus::Ideas);
        assert!(text.starts_with("Reading page...\n"));
        assert!(text.contains("Analyzing page content...\n"));
        assert_eq!(text.matches("1. Grid").count(), 1);
        assert!(text.ends_with("   Solution: s\n"));
    }

    #[test]
    fn empty_idea_list_ends_in_error() {
        let runner = runner(Vec::new());
        let (status, text) = drive(&runner, ARTICLE, false);
        assert_eq!(
            status,
            PopupStatus::Error {
                message: NO_IDEAS_MESSAGE.to_string()
            }
        );
        assert!(text.ends_with(&format!("Error: {NO_IDEAS_MESSAGE}\n")));
    }

    #[test]
    fn short_page_reports_single_error() {
        let runner = runner(vec![idea("Unused")]);
        let (status, text) = drive(&runner, TINY, false);
        assert!(matches!(status, PopupStatus::Error { ref message } if message.starts_with("content too short")));
        assert_eq!(text.matches("Error:").count(), 1);
        assert!(!text.contains("Analyzing"));
    }

    #[test]
    fn interrupt_cancels_the_running_cycle() {
        let runner = runner(vec![idea("Unused")]);
        let (status, text) = drive(&runner, SLOW, true);
        assert_eq!(
            status,
            PopupStatus::Error {
                message: CANCELLED_MESSAGE.to_string()
            }
        );
        assert_eq!(text, format!("Reading page...\nError: {CANCELLED_MESSAGE}\n"));
    }
}

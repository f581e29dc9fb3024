//! Thin binary-crate shell: CLI parsing, layered configuration, and the
//! tracing pipeline wired around the resolution-and-action core. The core
//! itself lives in the sibling crates under `crates/` (see `DESIGN.md`).

pub mod cli;
pub mod config;
pub mod logging;

use std::sync::Arc;

use ai_locator::{AiLocator, DisabledAiLocator, HttpAiLocator, HttpAiLocatorConfig};
use anyhow::Context;
use browser_driver::{ChromiumDriver, DriverError};
use coordinator::{Coordinator, CoordinatorConfig, RunRequest};
use data_consumer::DataConsumer;
use event_bus::{EventBus, InMemoryBus, RunnerEvent};
use learning_store::LearningStore;
use resolution_engine::ResolutionConfig;
use tokio_util::sync::CancellationToken;

use cli::RunArgs;
use config::RunnerConfig;

/// Builds the process-wide shared components (§5: Learning Store and Data
/// Consumer are process-wide, single-writer each) and runs `args.parallel`
/// identical requests through the Parallel Coordinator, printing every
/// published event as newline-delimited JSON (spec.md §6.5).
pub async fn run(args: RunArgs, config: RunnerConfig) -> anyhow::Result<bool> {
    let script = std::fs::read_to_string(&args.steps)
        .with_context(|| format!("reading step script at {}", args.steps.display()))?;

    let learning_store = Arc::new(
        LearningStore::open(config.learning_store_path.clone()).context("opening learning store")?,
    );

    // A missing or absent data CSV is not fatal (§6.3): only scripts that
    // reference `%Name%` placeholders need one, and the Session reports
    // `NoDataAvailable`/aborts only those that do.
    let data_consumer = DataConsumer::open(config.data_csv_path.clone())
        .ok()
        .map(Arc::new);

    let ai_locator: Arc<dyn AiLocator> = if config.ai_enabled && !config.ai_api_key.is_empty() {
        HttpAiLocator::new(HttpAiLocatorConfig {
            endpoint: config.ai_endpoint.clone(),
            api_key: config.ai_api_key.clone(),
            requests_per_minute: config.ai_requests_per_minute,
            ..HttpAiLocatorConfig::default()
        })
    } else {
        Arc::new(DisabledAiLocator)
    };

    let bus: Arc<dyn EventBus<RunnerEvent>> = InMemoryBus::new(1024);
    let mut subscription = bus.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match subscription.recv().await {
                Ok(event) => {
                    if let Ok(line) = serde_json::to_string(&event) {
                        println!("{line}");
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let coord_config = CoordinatorConfig {
        resolution: ResolutionConfig {
            candidate_timeout: config.candidate_timeout(),
            action_timeout: config.action_timeout(),
            ai_enabled: args.use_ai,
            screenshot_dir: config.screenshot_dir.clone().map(Into::into),
            ..ResolutionConfig::default()
        },
    };
    let coordinator = Coordinator::new(
        learning_store,
        ai_locator,
        data_consumer,
        bus.clone(),
        coord_config,
    );

    let data_preference: runner_core_types::RowPreference = args.data_preference.into();
    let requests: Vec<RunRequest> = (0..args.parallel.max(1))
        .map(|_| RunRequest {
            url: args.url.clone(),
            script: script.clone(),
            use_ai: args.use_ai,
            data_preference,
            continue_on_failure: args.continue_on_failure,
        })
        .collect();

    // `ChromiumDriver::launch` reads its headless default from this env var
    // (spec.md §6.4's `headless` field, translated to the driver's own
    // auto-detection convention — see browser-driver's chromium.rs).
    let headless = args.headless || config.headless;
    std::env::set_var("SCENARIO_RUNNER_HEADLESS", if headless { "1" } else { "0" });

    let reports = coordinator
        .run_all(requests, make_driver, CancellationToken::new())
        .await;

    drop(coordinator);
    drop(bus);
    let _ = printer.await;

    Ok(reports.iter().all(|r| r.ok))
}

/// Launches one real Chromium instance per Session (spec.md §4.7 step 1).
/// A launch failure is not treated as fatal to the whole run: the
/// Coordinator reports that one Session as failed and keeps the others
/// going (P10).
async fn make_driver() -> Result<ChromiumDriver, DriverError> {
    ChromiumDriver::launch().await
}

//! Session Executor (spec.md §4.7, component C7): runs one step list against
//! one browser context, publishing progress events and guaranteeing cleanup
//! on every exit path — parse error, data exhaustion, per-step failure,
//! per-session deadline, or coordinator cancellation (P8).
//!
//! Cleanup is structural rather than a `finally` block: [`run`] takes
//! ownership of the driver, so however the function returns, the driver (and
//! whatever browser resources its `Drop` impl releases) goes out of scope
//! with it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use browser_driver::BrowserDriver;
use chrono::Utc;
use data_consumer::{expand_step_strings, DataConsumer, ReservedRow};
use event_bus::{EventBus, Metrics, RunnerEvent, Via};
use resolution_engine::{FailureOutcome, ResolutionEngine, StepFailureKind};
use runner_core_types::{RowPreference, SessionId};
use step_parser::Action;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub session_id: SessionId,
    pub url: String,
    pub script: String,
    pub data_preference: RowPreference,
    /// Stop-on-first-failure is the repository default (§4.7); `true` runs
    /// every step regardless of earlier failures.
    pub continue_on_failure: bool,
    /// Per-Session hard deadline (§5). `None` means no deadline beyond the
    /// per-action timeout already enforced by the Resolution Engine.
    pub deadline: Option<Duration>,
}

impl SessionOptions {
    pub fn new(session_id: SessionId, url: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            session_id,
            url: url.into(),
            script: script.into(),
            data_preference: RowPreference::Mixed,
            continue_on_failure: false,
            deadline: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub ok: bool,
    pub metrics: Metrics,
}

/// Runs `options.script` against `driver`, already navigated-capable but not
/// yet navigated (`run` performs the initial `navigate` itself, per §4.7
/// step 1). Returns once `SessionEnd` has been published; the caller never
/// needs to call anything on `driver` again.
#[instrument(skip(driver, engine, data_consumer, bus), fields(session_id = %options.session_id))]
pub async fn run(
    options: SessionOptions,
    driver: impl BrowserDriver,
    engine: Arc<ResolutionEngine>,
    data_consumer: Option<Arc<DataConsumer>>,
    bus: Arc<dyn EventBus<RunnerEvent>>,
    cancel: CancellationToken,
) -> SessionReport {
    let start = Instant::now();
    let mut metrics = Metrics::default();
    let session_id = options.session_id.clone();

    if let Err(kind) = driver.navigate(&options.url).await.map_err(|_| StepFailureKind::NavigationFailed) {
        warn!(error = ?kind, "navigation failed, session aborting before any step runs");
        metrics.wall_time_ms = start.elapsed().as_millis() as u64;
        publish_session_end(&bus, &session_id, false, metrics.clone()).await;
        return SessionReport {
            session_id,
            ok: false,
            metrics,
        };
    }

    let steps = step_parser::parse_script(&options.script);
    metrics.step_count = steps.len() as u32;

    let uses_placeholders = steps.iter().any(|s| action_uses_placeholders(&s.action));
    let mut reserved_row: Option<ReservedRow> = None;
    if uses_placeholders {
        match &data_consumer {
            Some(consumer) => match consumer.reserve(options.data_preference) {
                Some(row) => reserved_row = Some(row),
                None => {
                    warn!("no data row available for the requested preference, session aborting");
                    metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                    publish_session_end(&bus, &session_id, false, metrics.clone()).await;
                    return SessionReport {
                        session_id,
                        ok: false,
                        metrics,
                    };
                }
            },
            None => {
                warn!("steps reference %Name% placeholders but no data consumer was configured");
                metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                publish_session_end(&bus, &session_id, false, metrics.clone()).await;
                return SessionReport {
                    session_id,
                    ok: false,
                    metrics,
                };
            }
        }
    }

    let mut session_ok = true;

    for step in &steps {
        if cancel.is_cancelled() {
            publish(&bus, RunnerEvent::StepEnd {
                session_id: session_id.clone(),
                timestamp: Utc::now(),
                n: step.line_number,
                ok: false,
                via: None,
                selector: None,
                error: Some(StepFailureKind::Cancelled.to_string()),
            })
            .await;
            session_ok = false;
            break;
        }

        if let Some(deadline) = options.deadline {
            if start.elapsed() >= deadline {
                warn!("per-session deadline expired, ending session early");
                session_ok = false;
                break;
            }
        }

        publish(&bus, RunnerEvent::StepStart {
            session_id: session_id.clone(),
            timestamp: Utc::now(),
            n: step.line_number,
            action_kind: step.action.kind().map(|k| k.wire_name().to_string()).unwrap_or_else(|| "unknown".to_string()),
            target: step.action.target().map(str::to_string),
        })
        .await;

        let outcome = run_one_step(&step.action, &driver, &engine, reserved_row.as_ref()).await;

        match &outcome {
            Ok(success) => {
                metrics.steps_succeeded += 1;
                match success.via {
                    Via::Learned => metrics.selectors_reused += 1,
                    Via::Traditional => metrics.selectors_learned += 1,
                    Via::Ai => {
                        metrics.ai_invocations += 1;
                        metrics.ai_successes += 1;
                        metrics.selectors_learned += 1;
                    }
                }
                match success.via {
                    Via::Learned => {
                        publish(&bus, RunnerEvent::SelectorReused {
                            session_id: session_id.clone(),
                            timestamp: Utc::now(),
                            key: success.key.clone(),
                        })
                        .await;
                    }
                    Via::Ai => {
                        publish(&bus, RunnerEvent::AiInvoked {
                            session_id: session_id.clone(),
                            timestamp: Utc::now(),
                            key: success.key.clone(),
                            hit: true,
                        })
                        .await;
                        publish(&bus, RunnerEvent::SelectorLearned {
                            session_id: session_id.clone(),
                            timestamp: Utc::now(),
                            key: success.key.clone(),
                            selector: success.selector_used.clone(),
                        })
                        .await;
                    }
                    Via::Traditional => {
                        publish(&bus, RunnerEvent::SelectorLearned {
                            session_id: session_id.clone(),
                            timestamp: Utc::now(),
                            key: success.key.clone(),
                            selector: success.selector_used.clone(),
                        })
                        .await;
                    }
                }
                publish(&bus, RunnerEvent::StepEnd {
                    session_id: session_id.clone(),
                    timestamp: Utc::now(),
                    n: step.line_number,
                    ok: true,
                    via: Some(success.via),
                    selector: Some(success.selector_used.clone()),
                    error: None,
                })
                .await;
            }
            Err(failure) => {
                metrics.steps_failed += 1;
                if failure.ai_invoked {
                    metrics.ai_invocations += 1;
                    let target = step.action.target().map(str::to_string).unwrap_or_default();
                    publish(&bus, RunnerEvent::AiInvoked {
                        session_id: session_id.clone(),
                        timestamp: Utc::now(),
                        key: runner_core_types::normalize_key(&target),
                        hit: false,
                    })
                    .await;
                }
                publish(&bus, RunnerEvent::StepEnd {
                    session_id: session_id.clone(),
                    timestamp: Utc::now(),
                    n: step.line_number,
                    ok: false,
                    via: None,
                    selector: None,
                    error: Some(failure.kind.to_string()),
                })
                .await;
                session_ok = false;
                if !options.continue_on_failure {
                    break;
                }
            }
        }
    }

    if let Some(row) = &reserved_row {
        if let Some(consumer) = &data_consumer {
            if session_ok {
                if let Err(err) = consumer.commit(row) {
                    warn!(error = %err, "failed to persist data row as used");
                }
            } else {
                consumer.release(row);
            }
        }
    }

    metrics.wall_time_ms = start.elapsed().as_millis() as u64;
    publish_session_end(&bus, &session_id, session_ok, metrics.clone()).await;
    info!(ok = session_ok, steps = metrics.step_count, "session finished");

    SessionReport {
        session_id,
        ok: session_ok,
        metrics,
    }
}

fn bare_failure(kind: StepFailureKind) -> FailureOutcome {
    FailureOutcome {
        kind,
        detail: String::new(),
        candidates_tried: 0,
        screenshot_path: None,
        ai_invoked: false,
    }
}

async fn run_one_step(
    action: &Action,
    driver: &impl BrowserDriver,
    engine: &ResolutionEngine,
    reserved_row: Option<&ReservedRow>,
) -> Result<resolution_engine::SuccessOutcome, FailureOutcome> {
    if let Action::Wait { seconds } = action {
        tokio::time::sleep(Duration::from_secs_f64(*seconds)).await;
        return Ok(resolution_engine::SuccessOutcome {
            selector_used: String::new(),
            via: Via::Traditional,
            candidates_tried: 0,
            key: "wait".to_string(),
        });
    }

    if action.is_unknown() {
        return Err(bare_failure(StepFailureKind::ParseError));
    }

    let expanded = match (reserved_row, action) {
        (Some(row), _) => {
            expand_action(action, row).map_err(|_| bare_failure(StepFailureKind::PlaceholderUnresolved))?
        }
        (None, _) => action.clone(),
    };

    engine.resolve_and_act(&expanded, driver).await
}

fn action_uses_placeholders(action: &Action) -> bool {
    let has = |s: &str| s.contains('%');
    match action {
        Action::Fill { target, value } | Action::FillTextarea { target, value } => {
            has(target) || has(value)
        }
        Action::Click { target } | Action::Select { target, .. } | Action::Check { target, .. } => has(target),
        Action::Upload { target, file_path } => target.as_deref().map(has).unwrap_or(false) || has(file_path),
        Action::Verify { text } => has(text),
        Action::Wait { .. } | Action::Unknown { .. } => false,
    }
}

fn expand_action(action: &Action, row: &ReservedRow) -> Result<Action, data_consumer::UnknownPlaceholder> {
    Ok(match action {
        Action::Fill { target, value } => {
            let (t, v) = expand_step_strings(row, Some(target), Some(value))?;
            Action::Fill { target: t.unwrap(), value: v.unwrap() }
        }
        Action::FillTextarea { target, value } => {
            let (t, v) = expand_step_strings(row, Some(target), Some(value))?;
            Action::FillTextarea { target: t.unwrap(), value: v.unwrap() }
        }
        Action::Click { target } => {
            let (t, _) = expand_step_strings(row, Some(target), None)?;
            Action::Click { target: t.unwrap() }
        }
        Action::Select { target, option } => {
            let (t, v) = expand_step_strings(row, Some(target), Some(option))?;
            Action::Select { target: t.unwrap(), option: v.unwrap() }
        }
        Action::Check { target, state } => {
            let (t, _) = expand_step_strings(row, Some(target), None)?;
            Action::Check { target: t.unwrap(), state: *state }
        }
        Action::Upload { target, file_path } => {
            let (t, v) = expand_step_strings(row, target.as_deref(), Some(file_path))?;
            Action::Upload { target: t, file_path: v.unwrap() }
        }
        Action::Verify { text } => {
            let (t, _) = expand_step_strings(row, Some(text), None)?;
            Action::Verify { text: t.unwrap() }
        }
        Action::Wait { .. } | Action::Unknown { .. } => action.clone(),
    })
}

async fn publish(bus: &Arc<dyn EventBus<RunnerEvent>>, event: RunnerEvent) {
    if let Err(err) = bus.publish(event).await {
        warn!(error = %err, "failed to publish event");
    }
}

async fn publish_session_end(bus: &Arc<dyn EventBus<RunnerEvent>>, session_id: &SessionId, ok: bool, metrics: Metrics) {
    publish(bus, RunnerEvent::SessionEnd {
        session_id: session_id.clone(),
        timestamp: Utc::now(),
        ok,
        metrics,
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_locator::DisabledAiLocator;
    use browser_driver::{FakeDriver, FakeElement};
    use data_consumer::DataRow;
    use event_bus::InMemoryBus;
    use learning_store::LearningStore;
    use resolution_engine::ResolutionConfig;
    use runner_core_types::Scenario;

    fn engine() -> Arc<ResolutionEngine> {
        Arc::new(ResolutionEngine::new(
            Arc::new(LearningStore::in_memory()),
            Arc::new(DisabledAiLocator),
            ResolutionConfig::default(),
        ))
    }

    #[tokio::test]
    async fn p8_cleanup_runs_even_when_a_step_fails() {
        let driver = FakeDriver::new();
        let bus: Arc<dyn EventBus<RunnerEvent>> = InMemoryBus::new(16);
        let options = SessionOptions::new(
            SessionId::new(),
            "https://example.test/app",
            "Click \"Nowhere\"\n",
        );
        let report = run(options, driver, engine(), None, bus, CancellationToken::new()).await;
        assert!(!report.ok);
        assert_eq!(report.metrics.steps_failed, 1);
    }

    #[tokio::test]
    async fn stop_on_first_failure_skips_later_steps() {
        let driver = FakeDriver::new();
        driver.register_match("button:has-text('Submit')", "submit");
        driver.seed_element("submit", FakeElement::default());
        let bus: Arc<dyn EventBus<RunnerEvent>> = InMemoryBus::new(16);
        let script = "Click \"Nowhere\"\nClick \"Submit\"\n";
        let options = SessionOptions::new(SessionId::new(), "https://example.test/app", script);
        let report = run(options, driver, engine(), None, bus, CancellationToken::new()).await;
        assert_eq!(report.metrics.step_count, 2);
        assert_eq!(report.metrics.steps_succeeded, 0);
        assert_eq!(report.metrics.steps_failed, 1);
    }

    #[tokio::test]
    async fn placeholder_expansion_reaches_the_driver() {
        let driver = FakeDriver::new();
        driver.register_match("input[placeholder='County']", "county-input");
        driver.seed_element("county-input", FakeElement::default());
        let consumer = Arc::new(DataConsumer::in_memory(
            vec![DataRow {
                scenario: Scenario::Positive,
                used: false,
                fields: vec![("County".to_string(), "Loudoun".to_string())],
            }],
            vec!["County".to_string()],
        ));
        let bus: Arc<dyn EventBus<RunnerEvent>> = InMemoryBus::new(16);
        let script = "Fill \"County\" with \"%County%\"\n";
        let options = SessionOptions::new(SessionId::new(), "https://example.test/app", script);
        let report = run(options, driver, engine(), Some(consumer.clone()), bus, CancellationToken::new()).await;
        assert!(report.ok);
        assert_eq!(consumer.reserve(RowPreference::Mixed), None);
    }

    #[tokio::test]
    async fn ai_miss_publishes_ai_invoked_and_counts_it() {
        let driver = FakeDriver::new();
        let eng = Arc::new(ResolutionEngine::new(
            Arc::new(LearningStore::in_memory()),
            Arc::new(DisabledAiLocator),
            ResolutionConfig {
                ai_enabled: true,
                ..Default::default()
            },
        ));
        let concrete_bus = InMemoryBus::new(16);
        let mut rx = event_bus::to_mpsc(concrete_bus.clone(), 16);
        let bus: Arc<dyn EventBus<RunnerEvent>> = concrete_bus;
        let options = SessionOptions::new(
            SessionId::new(),
            "https://example.test/app",
            "Click \"Nowhere\"\n",
        );
        let report = run(options, driver, eng, None, bus, CancellationToken::new()).await;
        assert!(!report.ok);
        assert_eq!(report.metrics.ai_invocations, 1);

        let mut saw_ai_invoked_miss = false;
        while let Ok(event) = rx.try_recv() {
            if let RunnerEvent::AiInvoked { hit, .. } = event {
                assert!(!hit);
                saw_ai_invoked_miss = true;
            }
        }
        assert!(saw_ai_invoked_miss);
    }

    #[tokio::test]
    async fn no_data_available_aborts_before_any_step() {
        let driver = FakeDriver::new();
        let consumer = Arc::new(DataConsumer::in_memory(vec![], vec!["County".to_string()]));
        let bus: Arc<dyn EventBus<RunnerEvent>> = InMemoryBus::new(16);
        let script = "Fill \"County\" with \"%County%\"\n";
        let options = SessionOptions::new(SessionId::new(), "https://example.test/app", script);
        let report = run(options, driver, engine(), Some(consumer), bus, CancellationToken::new()).await;
        assert!(!report.ok);
        assert_eq!(report.metrics.steps_succeeded, 0);
    }
}

//! Cross-crate end-to-end tests for the binary crate's wiring (the handful
//! `SPEC_FULL.md`'s "Test tooling" section calls for): these exercise the
//! full Coordinator -> Session -> Resolution Engine -> Event Bus chain the
//! way `scenario-runner run` does, using `FakeDriver` in place of a real
//! Chromium instance.

use std::sync::Arc;

use ai_locator::DisabledAiLocator;
use browser_driver::{FakeDriver, FakeElement};
use coordinator::{Coordinator, CoordinatorConfig, RunRequest};
use data_consumer::{DataConsumer, DataRow};
use event_bus::{EventBus, InMemoryBus, RunnerEvent};
use learning_store::LearningStore;
use runner_core_types::{RowPreference, Scenario};
use tokio_util::sync::CancellationToken;

fn coordinator_with(
    learning_store: Arc<LearningStore>,
    data_consumer: Option<Arc<DataConsumer>>,
    bus: Arc<dyn EventBus<RunnerEvent>>,
) -> Coordinator {
    Coordinator::new(
        learning_store,
        Arc::new(DisabledAiLocator),
        data_consumer,
        bus,
        CoordinatorConfig::default(),
    )
}

/// S1-ish: a single click resolves via the plain text-click candidate and is
/// reported as a successful Session with one step succeeded.
#[tokio::test]
async fn single_session_click_resolves_and_reports_success() {
    let bus: Arc<dyn EventBus<RunnerEvent>> = InMemoryBus::new(64);
    let coord = coordinator_with(Arc::new(LearningStore::in_memory()), None, bus);

    let requests = vec![RunRequest {
        url: "https://example.test/app".to_string(),
        script: "Click \"Submit\"\n".to_string(),
        use_ai: false,
        data_preference: RowPreference::Mixed,
        continue_on_failure: false,
    }];

    let reports = coord
        .run_all(
            requests,
            || async {
                let driver = FakeDriver::new();
                driver.register_match("button:has-text('Submit')", "submit-btn");
                driver.seed_element("submit-btn", FakeElement::default());
                Ok(driver)
            },
            CancellationToken::new(),
        )
        .await;

    assert_eq!(reports.len(), 1);
    assert!(reports[0].ok);
    assert_eq!(reports[0].metrics.steps_succeeded, 1);
    assert_eq!(reports[0].metrics.steps_failed, 0);
}

/// S6-ish: a selector learned on the first session's step is reused (not
/// regenerated) by a second session against the same Learning Store.
#[tokio::test]
async fn learning_store_survives_across_sessions_and_is_reused() {
    let learning_store = Arc::new(LearningStore::in_memory());
    let bus: Arc<dyn EventBus<RunnerEvent>> = InMemoryBus::new(64);
    let coord = coordinator_with(learning_store.clone(), None, bus);

    let make_driver = || async {
        let driver = FakeDriver::new();
        driver.register_match("button:has-text('Submit')", "submit-btn");
        driver.seed_element("submit-btn", FakeElement::default());
        Ok(driver)
    };

    let first = coord
        .run_all(
            vec![RunRequest {
                url: "https://example.test/app".to_string(),
                script: "Click \"Submit\"\n".to_string(),
                use_ai: false,
                data_preference: RowPreference::Mixed,
                continue_on_failure: false,
            }],
            make_driver,
            CancellationToken::new(),
        )
        .await;
    assert!(first[0].ok);
    assert_eq!(first[0].metrics.selectors_learned, 1);

    let second = coord
        .run_all(
            vec![RunRequest {
                url: "https://example.test/app".to_string(),
                script: "Click \"Submit\"\n".to_string(),
                use_ai: false,
                data_preference: RowPreference::Mixed,
                continue_on_failure: false,
            }],
            make_driver,
            CancellationToken::new(),
        )
        .await;
    assert!(second[0].ok);
    assert_eq!(second[0].metrics.selectors_reused, 1);
    assert_eq!(second[0].metrics.selectors_learned, 0);
}

/// P10 at the full-wiring level: one session whose target never resolves
/// does not prevent the other, fully independent session from succeeding.
#[tokio::test]
async fn one_session_failing_does_not_block_a_parallel_sibling() {
    let bus: Arc<dyn EventBus<RunnerEvent>> = InMemoryBus::new(64);
    let coord = coordinator_with(Arc::new(LearningStore::in_memory()), None, bus);

    let requests = vec![
        RunRequest {
            url: "https://example.test/a".to_string(),
            script: "Click \"Nowhere\"\n".to_string(),
            use_ai: false,
            data_preference: RowPreference::Mixed,
            continue_on_failure: false,
        },
        RunRequest {
            url: "https://example.test/b".to_string(),
            script: "Click \"Submit\"\n".to_string(),
            use_ai: false,
            data_preference: RowPreference::Mixed,
            continue_on_failure: false,
        },
    ];

    let reports = coord
        .run_all(
            requests,
            || async {
                let driver = FakeDriver::new();
                driver.register_match("button:has-text('Submit')", "submit-btn");
                driver.seed_element("submit-btn", FakeElement::default());
                Ok(driver)
            },
            CancellationToken::new(),
        )
        .await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports.iter().filter(|r| r.ok).count(), 1);
    assert_eq!(reports.iter().filter(|r| !r.ok).count(), 1);
}

/// A script whose steps need `%Name%` placeholders reserves a Data
/// Consumer row, fills using it, and commits the row as used on success.
#[tokio::test]
async fn placeholder_driven_fill_reserves_and_commits_a_data_row() {
    let data_consumer = Arc::new(DataConsumer::in_memory(
        vec![DataRow {
            scenario: Scenario::Positive,
            used: false,
            fields: vec![("County".to_string(), "Loudoun".to_string())],
        }],
        vec!["County".to_string()],
    ));
    let bus: Arc<dyn EventBus<RunnerEvent>> = InMemoryBus::new(64);
    let coord = coordinator_with(
        Arc::new(LearningStore::in_memory()),
        Some(data_consumer.clone()),
        bus,
    );

    let requests = vec![RunRequest {
        url: "https://example.test/app".to_string(),
        script: "Fill \"County\" with \"%County%\"\n".to_string(),
        use_ai: false,
        data_preference: RowPreference::Mixed,
        continue_on_failure: false,
    }];

    let reports = coord
        .run_all(
            requests,
            || async {
                let driver = FakeDriver::new();
                driver.register_match("input[placeholder='County']", "county-input");
                driver.seed_element("county-input", FakeElement::default());
                Ok(driver)
            },
            CancellationToken::new(),
        )
        .await;

    assert!(reports[0].ok);
    // The one available row was reserved and committed; none remains.
    assert_eq!(data_consumer.reserve(RowPreference::Mixed), None);
}

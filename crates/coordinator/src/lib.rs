//! Parallel Coordinator (spec.md §4.8, component C8): accepts `N`
//! independent `(url, steps, options)` requests and runs them as concurrent
//! tokio tasks, each with its own disjoint [`SessionId`], browser context,
//! and (if needed) reserved data row, sharing only the process-wide
//! [`LearningStore`] and [`DataConsumer`] (both already lock-protected) and
//! the [`EventBus`] progress channel.
//!
//! Generating a dataset when none exists is the external hook §4.6 places
//! out of scope; this coordinator never calls one — a request whose steps
//! need placeholders but whose dataset is empty simply reports
//! `NoDataAvailable` for that Session, exactly as it would for a dataset
//! that ran dry mid-run.

use std::future::Future;
use std::sync::Arc;

use ai_locator::AiLocator;
use chrono::Utc;
use data_consumer::DataConsumer;
use event_bus::{EventBus, RunnerEvent};
use learning_store::LearningStore;
use resolution_engine::{ResolutionConfig, ResolutionEngine};
use runner_core_types::{RowPreference, SessionId};
use session::{SessionOptions, SessionReport};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use browser_driver::{BrowserDriver, DriverError};

/// One Session's worth of work, in the shape of the submission contract
/// (spec.md §6.4), minus the dataset-generation counts — this build never
/// invokes a generator.
#[derive(Clone, Debug)]
pub struct RunRequest {
    pub url: String,
    pub script: String,
    pub use_ai: bool,
    pub data_preference: RowPreference,
    pub continue_on_failure: bool,
}

pub struct CoordinatorConfig {
    pub resolution: ResolutionConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            resolution: ResolutionConfig::default(),
        }
    }
}

/// Process-wide shared state (§5, "Shared resources") plus the progress
/// sink every spawned Session reports through.
pub struct Coordinator {
    learning_store: Arc<LearningStore>,
    ai_locator: Arc<dyn AiLocator>,
    data_consumer: Option<Arc<DataConsumer>>,
    bus: Arc<dyn EventBus<RunnerEvent>>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(
        learning_store: Arc<LearningStore>,
        ai_locator: Arc<dyn AiLocator>,
        data_consumer: Option<Arc<DataConsumer>>,
        bus: Arc<dyn EventBus<RunnerEvent>>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            learning_store,
            ai_locator,
            data_consumer,
            bus,
            config,
        }
    }

    /// Runs every request concurrently, each on its own Session task with a
    /// freshly made driver from `make_driver`. No request's failure, hang,
    /// or cancellation prevents the others from completing (P10) — a
    /// request whose driver fails to launch is reported as a failed Session
    /// rather than aborting the batch.
    #[instrument(skip(self, requests, make_driver, cancel))]
    pub async fn run_all<D, F, Fut>(
        &self,
        requests: Vec<RunRequest>,
        make_driver: F,
        cancel: CancellationToken,
    ) -> Vec<SessionReport>
    where
        D: BrowserDriver + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<D, DriverError>> + Send + 'static,
    {
        let total = requests.len();
        let make_driver = Arc::new(make_driver);
        let mut tasks = JoinSet::new();

        for request in requests {
            let engine = Arc::new(ResolutionEngine::new(
                self.learning_store.clone(),
                self.ai_locator.clone(),
                ResolutionConfig {
                    ai_enabled: request.use_ai,
                    ..self.config.resolution.clone()
                },
            ));
            let data_consumer = self.data_consumer.clone();
            let bus = self.bus.clone();
            let session_cancel = cancel.clone();
            let make_driver = make_driver.clone();

            tasks.spawn(async move {
                let session_id = SessionId::new();
                let driver = match make_driver().await {
                    Ok(driver) => driver,
                    Err(err) => {
                        warn!(error = %err, "driver launch failed, reporting session as failed");
                        return SessionReport {
                            session_id,
                            ok: false,
                            metrics: event_bus::Metrics::default(),
                        };
                    }
                };

                let options = SessionOptions {
                    session_id,
                    url: request.url,
                    script: request.script,
                    data_preference: request.data_preference,
                    continue_on_failure: request.continue_on_failure,
                    deadline: None,
                };

                session::run(options, driver, engine, data_consumer, bus, session_cancel).await
            });
        }

        let mut reports = Vec::with_capacity(total);
        let mut completed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(join_err) => {
                    warn!(error = %join_err, "a session task panicked; treating it as failed");
                }
            }
            completed += 1;
            self.publish_progress(completed, total).await;
        }

        reports
    }

    async fn publish_progress(&self, completed: usize, total: usize) {
        let event = RunnerEvent::ProgressPercent {
            timestamp: Utc::now(),
            completed,
            total,
        };
        if let Err(err) = self.bus.publish(event).await {
            warn!(error = %err, "failed to publish progress event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_locator::DisabledAiLocator;
    use browser_driver::FakeDriver;
    use event_bus::InMemoryBus;

    fn coordinator() -> Coordinator {
        Coordinator::new(
            Arc::new(LearningStore::in_memory()),
            Arc::new(DisabledAiLocator),
            None,
            InMemoryBus::new(64),
            CoordinatorConfig::default(),
        )
    }

    #[tokio::test]
    async fn p10_one_failing_session_does_not_block_others() {
        let coord = coordinator();
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
                script: "Wait for 0 seconds\n".to_string(),
                use_ai: false,
                data_preference: RowPreference::Mixed,
                continue_on_failure: false,
            },
        ];

        let reports = coord
            .run_all(requests, || async { Ok(FakeDriver::new()) }, CancellationToken::new())
            .await;

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().any(|r| !r.ok));
        assert!(reports.iter().any(|r| r.ok));
    }

    #[tokio::test]
    async fn disjoint_session_ids_across_requests() {
        let coord = coordinator();
        let requests = vec![
            RunRequest {
                url: "https://example.test/a".to_string(),
                script: String::new(),
                use_ai: false,
                data_preference: RowPreference::Mixed,
                continue_on_failure: false,
            },
            RunRequest {
                url: "https://example.test/b".to_string(),
                script: String::new(),
                use_ai: false,
                data_preference: RowPreference::Mixed,
                continue_on_failure: false,
            },
        ];
        let reports = coord
            .run_all(requests, || async { Ok(FakeDriver::new()) }, CancellationToken::new())
            .await;
        assert_ne!(reports[0].session_id, reports[1].session_id);
    }

    #[tokio::test]
    async fn driver_launch_failure_is_reported_not_panicked() {
        let coord = coordinator();
        let requests = vec![RunRequest {
            url: "https://example.test/a".to_string(),
            script: String::new(),
            use_ai: false,
            data_preference: RowPreference::Mixed,
            continue_on_failure: false,
        }];
        let reports = coord
            .run_all(
                requests,
                || async { Err(DriverError::Launch("no chrome".to_string())) },
                CancellationToken::new(),
            )
            .await;
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].ok);
    }
}

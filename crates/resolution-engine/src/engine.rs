//! Resolution Engine (spec.md §4.5, component C5).
//!
//! `resolve_and_act(action, driver) -> ResolutionOutcome` — the algorithm in
//! §4.5 verbatim: Learning Store lookup, then generated candidates, then
//! (optionally) the AI Locator, trying each candidate's element-level
//! sub-strategies (`attempt.rs`) in order and short-circuiting on the first
//! success. Order is part of the contract (P2, P3, P4): nothing here is
//! randomized or environment-dependent.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use browser_driver::{BrowserDriver, ElementRef};
use event_bus::Via;
use runner_core_types::{normalize_key, ActionKind};
use step_parser::Action;
use tracing::{instrument, warn};

use crate::attempt::{CheckAction, ClickAction, ElementAction, FillAction};
use crate::error::StepFailureKind;
use ai_locator::AiLocator;
use learning_store::LearningStore;
use selector_strategy::{Candidate, Context};

#[derive(Clone, Debug)]
pub struct SuccessOutcome {
    pub selector_used: String,
    pub via: Via,
    pub candidates_tried: usize,
    pub key: String,
}

#[derive(Clone, Debug)]
pub struct FailureOutcome {
    pub kind: StepFailureKind,
    pub detail: String,
    pub candidates_tried: usize,
    pub screenshot_path: Option<PathBuf>,
    /// Whether the AI Locator was actually consulted (and rejected or
    /// unable to help) before this failure, so callers can still publish
    /// `AiInvoked { hit: false }` and count the attempt even though
    /// resolution ultimately failed.
    pub ai_invoked: bool,
}

pub type ResolutionOutcome = Result<SuccessOutcome, FailureOutcome>;

/// The two configurable durations spec.md §9's Open Question resolves in
/// favor of: a single per-candidate timeout and a single per-action budget,
/// rather than the source's handful of ad-hoc hard-coded waits.
#[derive(Clone, Debug)]
pub struct ResolutionConfig {
    pub candidate_timeout: Duration,
    pub action_timeout: Duration,
    pub ai_enabled: bool,
    /// Directory debug screenshots land in on `ElementNotFound`/
    /// `ElementNotActionable` (§7's `debug_not_found_<slug>.png`). `None`
    /// disables capture entirely (e.g. the fake driver in unit tests).
    pub screenshot_dir: Option<PathBuf>,
    pub verify_poll_interval: Duration,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            candidate_timeout: Duration::from_secs(2),
            action_timeout: Duration::from_secs(30),
            ai_enabled: false,
            screenshot_dir: None,
            verify_poll_interval: Duration::from_millis(200),
        }
    }
}

pub struct ResolutionEngine {
    learning_store: Arc<LearningStore>,
    ai_locator: Arc<dyn AiLocator>,
    config: ResolutionConfig,
}

impl ResolutionEngine {
    pub fn new(
        learning_store: Arc<LearningStore>,
        ai_locator: Arc<dyn AiLocator>,
        config: ResolutionConfig,
    ) -> Self {
        Self {
            learning_store,
            ai_locator,
            config,
        }
    }

    #[instrument(skip(self, driver), fields(action = ?action.kind()))]
    pub async fn resolve_and_act(
        &self,
        action: &Action,
        driver: &dyn BrowserDriver,
    ) -> ResolutionOutcome {
        match action {
            Action::Click { target } => {
                let candidates = selector_strategy::generate(target, ActionKind::Click, &Context::default());
                self.resolve_with_candidates(target, ActionKind::Click, driver, candidates, &ClickAction)
                    .await
            }
            Action::Fill { target, value } => {
                let candidates = selector_strategy::generate(target, ActionKind::Fill, &Context::default());
                self.resolve_with_candidates(
                    target,
                    ActionKind::Fill,
                    driver,
                    candidates,
                    &FillAction { value },
                )
                .await
            }
            Action::FillTextarea { target, value } => {
                let candidates =
                    selector_strategy::generate(target, ActionKind::FillTextarea, &Context::default());
                self.resolve_with_candidates(
                    target,
                    ActionKind::FillTextarea,
                    driver,
                    candidates,
                    &FillAction { value },
                )
                .await
            }
            Action::Check { target, state } => {
                let candidates = selector_strategy::generate(target, ActionKind::Check, &Context::default());
                self.resolve_with_candidates(
                    target,
                    ActionKind::Check,
                    driver,
                    candidates,
                    &CheckAction { desired_state: *state },
                )
                .await
            }
            Action::Select { target, option } => self.resolve_select(target, option, driver).await,
            Action::Upload { target, file_path } => {
                self.resolve_upload(target.as_deref(), file_path, driver).await
            }
            Action::Verify { text } => self.verify(text, driver).await,
            Action::Wait { .. } | Action::Unknown { .. } => Err(FailureOutcome {
                kind: StepFailureKind::DriverError,
                detail: "resolve_and_act called with a non-resolvable action".to_string(),
                candidates_tried: 0,
                screenshot_path: None,
                ai_invoked: false,
            }),
        }
    }

    /// The shared shape of §4.5 steps 1-6 for any action whose candidates
    /// resolve a single element and whose success is determined by
    /// `action_impl` (Click/Fill/FillTextarea/Check).
    async fn resolve_with_candidates(
        &self,
        target: &str,
        kind: ActionKind,
        driver: &dyn BrowserDriver,
        candidates: Vec<Candidate>,
        action_impl: &dyn ElementAction,
    ) -> ResolutionOutcome {
        let key = normalize_key(target);
        let start = Instant::now();
        let mut tried = 0usize;

        if let Some(learned) = self.learning_store.lookup(&key) {
            tried += 1;
            if self.try_candidate(driver, &learned.selector, action_impl).await {
                let _ = self
                    .learning_store
                    .record_success(&key, &learned.selector, target, kind);
                return Ok(SuccessOutcome {
                    selector_used: learned.selector,
                    via: Via::Learned,
                    candidates_tried: tried,
                    key,
                });
            }
            // Stale learned selector: fall through without forgetting it
            // yet (§4.3 — only overwritten by the next success, never
            // removed just because one attempt failed).
        }

        for candidate in &candidates {
            if start.elapsed() > self.config.action_timeout {
                break;
            }
            let rendered = candidate.render();
            tried += 1;
            if self.try_candidate(driver, &rendered, action_impl).await {
                let _ = self
                    .learning_store
                    .record_success(&key, &rendered, target, kind);
                return Ok(SuccessOutcome {
                    selector_used: rendered,
                    via: Via::Traditional,
                    candidates_tried: tried,
                    key,
                });
            }
        }

        // Whether the AI Locator was actually asked, independent of whether
        // it had a suggestion or that suggestion panned out. `suggest`
        // collapses every internal failure mode to `None` (spec.md §4.4),
        // so "invoked" means "reached this point with AI enabled", not
        // "returned a usable candidate".
        let ai_invoked = self.config.ai_enabled;
        if ai_invoked {
            if let Some(rendered) = self.try_ai_suggestion(target, kind, driver).await {
                tried += 1;
                if self.try_candidate(driver, &rendered, action_impl).await {
                    let _ = self
                        .learning_store
                        .record_success(&key, &rendered, target, kind);
                    return Ok(SuccessOutcome {
                        selector_used: rendered,
                        via: Via::Ai,
                        candidates_tried: tried,
                        key,
                    });
                }
            }
        }

        let screenshot_path = self.capture_screenshot(driver, &key).await;
        Err(FailureOutcome {
            kind: StepFailureKind::ElementNotFound,
            detail: format!("no candidate resolved target '{target}' ({tried} tried)"),
            candidates_tried: tried,
            screenshot_path,
            ai_invoked,
        })
    }

    async fn resolve_select(
        &self,
        target: &str,
        option: &str,
        driver: &dyn BrowserDriver,
    ) -> ResolutionOutcome {
        let key = normalize_key(target);
        let context = Context::default();
        let trigger_candidates = selector_strategy::generate_select_trigger(target, &context);

        let trigger = self
            .resolve_trigger_element(&key, target, trigger_candidates, driver)
            .await?;

        let is_native = driver.is_native_select(&trigger.element).await.unwrap_or(false);
        if is_native {
            if driver.select_native_value(&trigger.element, option).await.is_ok() {
                let _ = self.learning_store.record_success(
                    &key,
                    &trigger.selector,
                    target,
                    ActionKind::Select,
                );
                return Ok(SuccessOutcome {
                    selector_used: trigger.selector,
                    via: trigger.via,
                    candidates_tried: trigger.candidates_tried,
                    key,
                });
            }
            return Err(FailureOutcome {
                kind: StepFailureKind::ElementNotActionable,
                detail: format!("could not set value on native select '{target}'"),
                candidates_tried: trigger.candidates_tried,
                screenshot_path: self.capture_screenshot(driver, &key).await,
                ai_invoked: false,
            });
        } else if driver.open_dropdown(&trigger.element).await.is_err() {
            return Err(FailureOutcome {
                kind: StepFailureKind::ElementNotActionable,
                detail: format!("could not open dropdown for '{target}'"),
                candidates_tried: trigger.candidates_tried,
                screenshot_path: self.capture_screenshot(driver, &key).await,
                ai_invoked: false,
            });
        }

        let option_candidates = selector_strategy::generate_select_option(option, &context);
        let mut tried = trigger.candidates_tried;
        for candidate in &option_candidates {
            let rendered = candidate.render();
            tried += 1;
            if let Ok(Some(el)) = self.timed_query(driver, &rendered).await {
                if self.try_candidate(driver, &rendered, &ClickAction).await {
                    let _ = self.learning_store.record_success(&key, &trigger.selector, target, ActionKind::Select);
                    let _ = el; // the option element itself is not remembered, only the trigger
                    return Ok(SuccessOutcome {
                        selector_used: trigger.selector,
                        via: trigger.via,
                        candidates_tried: tried,
                        key,
                    });
                }
            }
        }

        Err(FailureOutcome {
            kind: StepFailureKind::ElementNotFound,
            detail: format!("option '{option}' did not resolve under trigger '{target}'"),
            candidates_tried: tried,
            screenshot_path: self.capture_screenshot(driver, &key).await,
            ai_invoked: false,
        })
    }

    /// Locates the Select trigger element via the learned-then-generated
    /// candidate order, without yet acting on it (the caller decides native
    /// vs. custom-dropdown behavior once it has the element).
    async fn resolve_trigger_element(
        &self,
        key: &str,
        target: &str,
        candidates: Vec<Candidate>,
        driver: &dyn BrowserDriver,
    ) -> Result<ResolvedTrigger, FailureOutcome> {
        let mut tried = 0usize;

        if let Some(learned) = self.learning_store.lookup(key) {
            tried += 1;
            if let Ok(Some(el)) = self.timed_query(driver, &learned.selector).await {
                return Ok(ResolvedTrigger {
                    element: el,
                    selector: learned.selector,
                    via: Via::Learned,
                    candidates_tried: tried,
                });
            }
        }

        for candidate in &candidates {
            let rendered = candidate.render();
            tried += 1;
            if let Ok(Some(el)) = self.timed_query(driver, &rendered).await {
                return Ok(ResolvedTrigger {
                    element: el,
                    selector: rendered,
                    via: Via::Traditional,
                    candidates_tried: tried,
                });
            }
        }

        Err(FailureOutcome {
            kind: StepFailureKind::ElementNotFound,
            detail: format!("no trigger candidate resolved target '{target}'"),
            candidates_tried: tried,
            screenshot_path: self.capture_screenshot(driver, key).await,
            ai_invoked: false,
        })
    }

    async fn resolve_upload(
        &self,
        target: Option<&str>,
        file_path: &str,
        driver: &dyn BrowserDriver,
    ) -> ResolutionOutcome {
        let key = normalize_key(target.unwrap_or("upload"));
        let context = Context::default();

        // Phase A: a visible activating button.
        let button_candidates = selector_strategy::generate_upload_button(target, &context);
        let mut tried = 0usize;
        for candidate in &button_candidates {
            let rendered = candidate.render();
            tried += 1;
            if let Ok(Some(el)) = self.timed_query(driver, &rendered).await {
                if driver.upload_via_button(&el, file_path).await.is_ok() {
                    let _ = self.learning_store.record_success(&key, &rendered, target.unwrap_or("upload"), ActionKind::Upload);
                    return Ok(SuccessOutcome {
                        selector_used: rendered,
                        via: Via::Traditional,
                        candidates_tried: tried,
                        key,
                    });
                }
            }
        }

        // Phase B: a direct file input, tried only once Phase A is exhausted.
        let input_candidates = selector_strategy::generate_upload_input(target, &context);
        for candidate in &input_candidates {
            let rendered = candidate.render();
            tried += 1;
            if let Ok(Some(el)) = self.timed_query(driver, &rendered).await {
                if driver.upload_via_input(&el, file_path).await.is_ok() {
                    let _ = self.learning_store.record_success(&key, &rendered, target.unwrap_or("upload"), ActionKind::Upload);
                    return Ok(SuccessOutcome {
                        selector_used: rendered,
                        via: Via::Traditional,
                        candidates_tried: tried,
                        key,
                    });
                }
            }
        }

        Err(FailureOutcome {
            kind: StepFailureKind::ElementNotFound,
            detail: "no upload button or file input resolved".to_string(),
            candidates_tried: tried,
            screenshot_path: self.capture_screenshot(driver, &key).await,
            ai_invoked: false,
        })
    }

    /// Verify has no candidate list (§4.2.4): it polls document-wide text
    /// presence for a bounded window rather than resolving an element.
    async fn verify(&self, text: &str, driver: &dyn BrowserDriver) -> ResolutionOutcome {
        let deadline = Instant::now() + self.config.action_timeout;
        loop {
            match driver.text_present(text).await {
                Ok(true) => {
                    return Ok(SuccessOutcome {
                        selector_used: selector_strategy::verify_text_query(text),
                        via: Via::Traditional,
                        candidates_tried: 1,
                        key: normalize_key(text),
                    })
                }
                _ if Instant::now() >= deadline => {
                    return Err(FailureOutcome {
                        kind: StepFailureKind::VerifyFailed,
                        detail: format!("text '{text}' not present before the verification window elapsed"),
                        candidates_tried: 1,
                        screenshot_path: None,
                        ai_invoked: false,
                    })
                }
                _ => tokio::time::sleep(self.config.verify_poll_interval).await,
            }
        }
    }

    async fn try_ai_suggestion(
        &self,
        target: &str,
        kind: ActionKind,
        driver: &dyn BrowserDriver,
    ) -> Option<String> {
        let snapshot = driver.dom_snapshot().await.ok()?;
        let fingerprint = driver.page_fingerprint().await.ok()?;
        let pruned = ai_locator::prune_snapshot(&snapshot, target, 4, 8_000);
        self.ai_locator.suggest(&pruned, &fingerprint, target, kind).await
    }

    async fn try_candidate(
        &self,
        driver: &dyn BrowserDriver,
        candidate: &str,
        action_impl: &dyn ElementAction,
    ) -> bool {
        let element = match self.timed_query(driver, candidate).await {
            Ok(Some(el)) => el,
            _ => return false,
        };
        match tokio::time::timeout(self.config.candidate_timeout, action_impl.try_on(driver, &element)).await {
            Ok(Ok(true)) => true,
            Ok(Ok(false)) => false,
            Ok(Err(err)) => {
                warn!(error = %err, candidate, "element action sub-strategies failed");
                false
            }
            Err(_) => false,
        }
    }

    async fn timed_query(
        &self,
        driver: &dyn BrowserDriver,
        candidate: &str,
    ) -> Result<Option<ElementRef>, browser_driver::DriverError> {
        match tokio::time::timeout(self.config.candidate_timeout, driver.query(candidate)).await {
            Ok(result) => result,
            Err(_) => Ok(None),
        }
    }

    async fn capture_screenshot(&self, driver: &dyn BrowserDriver, key: &str) -> Option<PathBuf> {
        let dir = self.config.screenshot_dir.as_ref()?;
        let path = dir.join(format!("debug_not_found_{key}.png"));
        match driver.screenshot(&path).await {
            Ok(()) => Some(path),
            Err(err) => {
                warn!(error = %err, "failed to capture debug screenshot, continuing without one");
                None
            }
        }
    }
}

struct ResolvedTrigger {
    element: ElementRef,
    selector: String,
    via: Via,
    candidates_tried: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_locator::DisabledAiLocator;
    use browser_driver::{FakeDriver, FakeElement};
    use learning_store::LearningStore;

    fn engine(ai_enabled: bool) -> ResolutionEngine {
        ResolutionEngine::new(
            Arc::new(LearningStore::in_memory()),
            Arc::new(DisabledAiLocator),
            ResolutionConfig {
                ai_enabled,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn s1_click_by_visible_span_beats_aria_label() {
        let driver = FakeDriver::new();
        driver.register_match("span.slds-page-header__title:has-text('Recently Viewed')", "span-el");
        driver.seed_element("span-el", FakeElement::default());
        let eng = engine(false);

        let action = Action::Click {
            target: "Recently Viewed".to_string(),
        };
        let outcome = eng.resolve_and_act(&action, &driver).await.unwrap();
        assert_eq!(outcome.selector_used, "span.slds-page-header__title:has-text('Recently Viewed')");
        assert_eq!(outcome.via, Via::Traditional);

        let learned = eng.learning_store.lookup("recently_viewed").unwrap();
        assert!(!learned.selector.contains("aria-label"));
    }

    #[tokio::test]
    async fn s2_form_row_dispatch_uses_row_aware_candidate() {
        let driver = FakeDriver::new();
        driver.register_match(
            "xpath=//p[contains(normalize-space(.), 'Form 2: Sustainability')]/following::span[normalize-space(text())='Start' or normalize-space(text())='Edit'][2]/ancestor::a[1]",
            "form2-link",
        );
        driver.seed_element("form2-link", FakeElement::default());
        let eng = engine(false);

        let action = Action::Click {
            target: "Form 2: Sustainability".to_string(),
        };
        let outcome = eng.resolve_and_act(&action, &driver).await.unwrap();
        assert!(outcome.selector_used.contains("following::span"));
    }

    #[tokio::test]
    async fn s3_select_prefers_input_role_combobox_over_button() {
        let driver = FakeDriver::new();
        driver.register_match(
            "text='Changes to Target Population Measures' >> xpath=following::input[@role='combobox'][1]",
            "combo",
        );
        driver.seed_element("combo", FakeElement::default());
        driver.register_match("[role='listbox'] [role='option']:has-text('Yes')", "opt-yes");
        driver.seed_element("opt-yes", FakeElement::default());
        let eng = engine(false);

        let action = Action::Select {
            target: "Changes to Target Population Measures".to_string(),
            option: "Yes".to_string(),
        };
        let outcome = eng.resolve_and_act(&action, &driver).await.unwrap();
        assert!(outcome.selector_used.contains("role='combobox'"));
    }

    #[tokio::test]
    async fn s4_label_anchored_textarea_fill() {
        let driver = FakeDriver::new();
        let label = "Please specify the names of the counties served.";
        driver.register_match(
            format!("xpath=//*[normalize-space(text())='{label}']//following::textarea[1]"),
            "counties",
        );
        driver.seed_element("counties", FakeElement::default());
        let eng = engine(false);

        let action = Action::FillTextarea {
            target: label.to_string(),
            value: "Loudoun".to_string(),
        };
        let outcome = eng.resolve_and_act(&action, &driver).await.unwrap();
        assert!(outcome.selector_used.contains("following::textarea[1]"));
        assert_eq!(driver.element("counties").unwrap().value, "Loudoun");
    }

    #[tokio::test]
    async fn s6_learning_survives_and_accelerates_second_run() {
        let driver = FakeDriver::new();
        driver.register_match("button:has-text('Submit')", "submit-btn");
        driver.seed_element("submit-btn", FakeElement::default());
        let eng = engine(false);
        let action = Action::Click {
            target: "Submit".to_string(),
        };

        let first = eng.resolve_and_act(&action, &driver).await.unwrap();
        assert_eq!(first.via, Via::Traditional);

        let second = eng.resolve_and_act(&action, &driver).await.unwrap();
        assert_eq!(second.via, Via::Learned);
        assert_eq!(second.candidates_tried, 1);
    }

    #[tokio::test]
    async fn element_not_found_reports_candidates_tried() {
        let driver = FakeDriver::new();
        let eng = engine(false);
        let action = Action::Click {
            target: "Nowhere".to_string(),
        };
        let failure = eng.resolve_and_act(&action, &driver).await.unwrap_err();
        assert_eq!(failure.kind, StepFailureKind::ElementNotFound);
        assert!(failure.candidates_tried > 0);
    }

    #[tokio::test]
    async fn failure_reports_ai_invoked_when_ai_was_consulted() {
        let driver = FakeDriver::new();
        let eng = engine(true);
        let action = Action::Click {
            target: "Nowhere".to_string(),
        };
        let failure = eng.resolve_and_act(&action, &driver).await.unwrap_err();
        assert!(failure.ai_invoked);
    }

    #[tokio::test]
    async fn failure_does_not_report_ai_invoked_when_ai_disabled() {
        let driver = FakeDriver::new();
        let eng = engine(false);
        let action = Action::Click {
            target: "Nowhere".to_string(),
        };
        let failure = eng.resolve_and_act(&action, &driver).await.unwrap_err();
        assert!(!failure.ai_invoked);
    }

    #[tokio::test]
    async fn verify_succeeds_once_text_becomes_present() {
        let driver = FakeDriver::new();
        driver.set_visible_text("Thank you for submitting");
        let eng = engine(false);
        let action = Action::Verify {
            text: "Thank you".to_string(),
        };
        let outcome = eng.resolve_and_act(&action, &driver).await.unwrap();
        assert_eq!(outcome.via, Via::Traditional);
    }
}

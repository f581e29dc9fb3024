//! Chromium-backed [`BrowserDriver`], mirroring the teacher's cdp-adapter
//! auto/real/stub detection (`SOULBROWSER_USE_REAL_CHROME`/`SOULBROWSER_CHROME`),
//! renamed to this project's own env vars.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use tracing::{info, instrument, warn};

use crate::error::DriverError;
use crate::js;
use crate::port::{BrowserDriver, ElementRef};

fn cdp_err(err: impl std::fmt::Display) -> DriverError {
    DriverError::Transport(err.to_string())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ChromeMode {
    Auto,
    ForceReal,
    ForceStub,
}

fn chrome_mode() -> ChromeMode {
    match std::env::var("SCENARIO_RUNNER_USE_REAL_CHROME")
        .unwrap_or_default()
        .to_ascii_lowercase()
        .as_str()
    {
        "1" | "true" | "yes" | "on" => ChromeMode::ForceReal,
        "0" | "false" | "no" | "off" => ChromeMode::ForceStub,
        _ => ChromeMode::Auto,
    }
}

fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("SCENARIO_RUNNER_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    for name in ["google-chrome-stable", "google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }
    None
}

fn resolve_headless_default() -> bool {
    match std::env::var("SCENARIO_RUNNER_HEADLESS") {
        Ok(value) => !matches!(value.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"),
        Err(_) => true,
    }
}

/// One Chromium instance + one page, driven entirely through `Page::evaluate`
/// (see `js.rs`) so the §4.2 candidate dialect never has to be translated
/// into a driver-native query API that doesn't support it.
pub struct ChromiumDriver {
    _browser: Browser,
    page: chromiumoxide::Page,
}

impl ChromiumDriver {
    /// Launch (or refuse to launch) a browser per the Auto/ForceReal/ForceStub
    /// policy. Returns `Err(DriverError::Launch)` under `ForceStub` or when
    /// auto-detection finds no Chrome — callers should fall back to
    /// [`crate::fake::FakeDriver`] in that case, matching the teacher's own
    /// "stub transport" fallback.
    pub async fn launch() -> Result<Self, DriverError> {
        let mode = chrome_mode();
        if matches!(mode, ChromeMode::ForceStub) {
            return Err(DriverError::Launch("forced stub mode".into()));
        }
        let executable = detect_chrome_executable();
        if executable.is_none() && matches!(mode, ChromeMode::ForceReal) {
            return Err(DriverError::Launch(
                "SCENARIO_RUNNER_USE_REAL_CHROME=1 but no Chrome/Chromium executable found".into(),
            ));
        }
        let Some(executable) = executable else {
            return Err(DriverError::Launch("no chrome executable found".into()));
        };

        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable)
            .request_timeout(Duration::from_secs(30));
        if resolve_headless_default() {
            builder = builder.with_head();
            // `with_head()` disables headless in chromiumoxide's builder
            // convention; the inverse call exists for completeness if a
            // future chromiumoxide version flips the default.
        }
        let config = builder.build().map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp_err)?;
        tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser.new_page("about:blank").await.map_err(cdp_err)?;
        info!("chromium driver launched");
        Ok(Self {
            _browser: browser,
            page,
        })
    }

    async fn eval_bool(&self, script: String) -> Result<bool, DriverError> {
        let result = self.page.evaluate(script).await.map_err(cdp_err)?;
        Ok(result.value().and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn eval_string(&self, script: String) -> Result<String, DriverError> {
        let result = self.page.evaluate(script).await.map_err(cdp_err)?;
        Ok(result
            .value()
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_default())
    }

    async fn eval_ref(&self, script: String) -> Result<Option<ElementRef>, DriverError> {
        let result = self.page.evaluate(script).await.map_err(cdp_err)?;
        Ok(result
            .value()
            .and_then(|v| v.as_str())
            .map(|s| ElementRef(s.to_string())))
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    #[instrument(skip(self))]
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.page.goto(url).await.map_err(cdp_err)?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(cdp_err)?;
        Ok(())
    }

    async fn query(&self, candidate: &str) -> Result<Option<ElementRef>, DriverError> {
        self.eval_ref(js::resolve_candidate(candidate)).await
    }

    async fn click_standard(&self, el: &ElementRef) -> Result<(), DriverError> {
        if !self.eval_bool(js::click_standard(&el.0)).await? {
            return Err(DriverError::StaleElement);
        }
        Ok(())
    }

    async fn click_scripted(&self, el: &ElementRef) -> Result<(), DriverError> {
        if !self.eval_bool(js::click_scripted(&el.0)).await? {
            return Err(DriverError::StaleElement);
        }
        Ok(())
    }

    async fn click_force(&self, el: &ElementRef) -> Result<(), DriverError> {
        if !self.eval_bool(js::click_force(&el.0)).await? {
            return Err(DriverError::StaleElement);
        }
        Ok(())
    }

    async fn click_synthesized_mouse_event(&self, el: &ElementRef) -> Result<(), DriverError> {
        if !self.eval_bool(js::click_synthesized_mouse_event(&el.0)).await? {
            return Err(DriverError::StaleElement);
        }
        Ok(())
    }

    async fn is_disabled_or_readonly(&self, el: &ElementRef) -> Result<bool, DriverError> {
        self.eval_bool(js::is_disabled_or_readonly(&el.0)).await
    }

    async fn clear_disabled_readonly_attrs(&self, el: &ElementRef) -> Result<(), DriverError> {
        self.eval_bool(js::clear_disabled_readonly(&el.0)).await?;
        Ok(())
    }

    async fn fill_native(&self, el: &ElementRef, value: &str) -> Result<(), DriverError> {
        if !self.eval_bool(js::fill_native(&el.0, value)).await? {
            return Err(DriverError::StaleElement);
        }
        Ok(())
    }

    async fn fill_keystroke(&self, el: &ElementRef, value: &str) -> Result<(), DriverError> {
        if !self.eval_bool(js::fill_keystroke(&el.0, value)).await? {
            return Err(DriverError::StaleElement);
        }
        Ok(())
    }

    async fn fill_scripted_dispatch(&self, el: &ElementRef, value: &str) -> Result<(), DriverError> {
        if !self.eval_bool(js::fill_scripted_dispatch(&el.0, value)).await? {
            return Err(DriverError::StaleElement);
        }
        Ok(())
    }

    async fn read_value(&self, el: &ElementRef) -> Result<String, DriverError> {
        self.eval_string(js::read_value(&el.0)).await
    }

    async fn is_native_select(&self, el: &ElementRef) -> Result<bool, DriverError> {
        self.eval_bool(js::is_native_select(&el.0)).await
    }

    async fn select_native_value(&self, el: &ElementRef, option_text: &str) -> Result<(), DriverError> {
        self.eval_bool(js::select_native_value(&el.0, option_text)).await?;
        Ok(())
    }

    async fn open_dropdown(&self, el: &ElementRef) -> Result<(), DriverError> {
        self.click_standard(el).await
    }

    async fn is_checked(&self, el: &ElementRef) -> Result<bool, DriverError> {
        self.eval_bool(js::is_checked(&el.0)).await
    }

    async fn click_associated_label(&self, el: &ElementRef) -> Result<(), DriverError> {
        self.eval_bool(js::click_associated_label(&el.0)).await?;
        Ok(())
    }

    async fn upload_via_button(&self, _el: &ElementRef, file_path: &str) -> Result<(), DriverError> {
        // File attachment needs the CDP DOM.setFileInputFiles call, which
        // this driver does not yet wire up; fail honestly instead of
        // clicking the button and reporting success without attaching
        // `file_path` to anything.
        warn!(file_path, "upload_via_button: no CDP file-input wiring in this driver");
        Err(DriverError::Unsupported("file upload is not implemented by ChromiumDriver".into()))
    }

    async fn upload_via_input(&self, _el: &ElementRef, file_path: &str) -> Result<(), DriverError> {
        warn!(file_path, "upload_via_input: no CDP file-input wiring in this driver");
        Err(DriverError::Unsupported("file upload is not implemented by ChromiumDriver".into()))
    }

    async fn text_present(&self, text: &str) -> Result<bool, DriverError> {
        self.eval_bool(js::text_present(text)).await
    }

    async fn dom_snapshot(&self) -> Result<String, DriverError> {
        self.eval_string(js::dom_snapshot().to_string()).await
    }

    async fn page_fingerprint(&self) -> Result<String, DriverError> {
        self.eval_string(js::page_fingerprint().to_string()).await
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let bytes = self.page.screenshot(params).await.map_err(cdp_err)?;
        std::fs::write(path, bytes).map_err(|e| DriverError::Transport(e.to_string()))
    }
}

//! An in-memory [`BrowserDriver`] for tests: a tiny scriptable model of a
//! page instead of a real browser. Mirrors the teacher's `NoopTransport`
//! fallback in spirit — deterministic, no external process required.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::DriverError;
use crate::port::{BrowserDriver, ElementRef};

#[derive(Clone, Debug, Default)]
pub struct FakeElement {
    pub value: String,
    pub checked: bool,
    pub disabled: bool,
    pub is_native_select: bool,
    pub options: Vec<String>,
}

#[derive(Default)]
struct State {
    navigated_to: Vec<String>,
    /// candidate string -> element id it should resolve to, if any.
    matches: HashMap<String, String>,
    elements: HashMap<String, FakeElement>,
    visible_text: String,
    screenshots_taken: Vec<std::path::PathBuf>,
}

/// A fully scriptable fake: tests register which candidate strings match
/// which element ids, and pre-seed each element's state, then assert on the
/// mutations the Resolution Engine's `attempt` logic makes.
pub struct FakeDriver {
    state: Mutex<State>,
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_match(&self, candidate: impl Into<String>, element_id: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .matches
            .insert(candidate.into(), element_id.into());
    }

    pub fn seed_element(&self, element_id: impl Into<String>, element: FakeElement) {
        self.state
            .lock()
            .unwrap()
            .elements
            .insert(element_id.into(), element);
    }

    pub fn set_visible_text(&self, text: impl Into<String>) {
        self.state.lock().unwrap().visible_text = text.into();
    }

    pub fn navigated_to(&self) -> Vec<String> {
        self.state.lock().unwrap().navigated_to.clone()
    }

    pub fn element(&self, element_id: &str) -> Option<FakeElement> {
        self.state.lock().unwrap().elements.get(element_id).cloned()
    }

    pub fn screenshots_taken(&self) -> usize {
        self.state.lock().unwrap().screenshots_taken.len()
    }
}

fn not_found() -> DriverError {
    DriverError::StaleElement
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.state.lock().unwrap().navigated_to.push(url.to_string());
        Ok(())
    }

    async fn query(&self, candidate: &str) -> Result<Option<ElementRef>, DriverError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .matches
            .get(candidate)
            .cloned()
            .map(ElementRef))
    }

    async fn click_standard(&self, _el: &ElementRef) -> Result<(), DriverError> {
        Ok(())
    }

    async fn click_scripted(&self, _el: &ElementRef) -> Result<(), DriverError> {
        Ok(())
    }

    async fn click_force(&self, _el: &ElementRef) -> Result<(), DriverError> {
        Ok(())
    }

    async fn click_synthesized_mouse_event(&self, _el: &ElementRef) -> Result<(), DriverError> {
        Ok(())
    }

    async fn is_disabled_or_readonly(&self, el: &ElementRef) -> Result<bool, DriverError> {
        let state = self.state.lock().unwrap();
        Ok(state.elements.get(&el.0).map(|e| e.disabled).unwrap_or(false))
    }

    async fn clear_disabled_readonly_attrs(&self, el: &ElementRef) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        if let Some(e) = state.elements.get_mut(&el.0) {
            e.disabled = false;
        }
        Ok(())
    }

    async fn fill_native(&self, el: &ElementRef, value: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let e = state.elements.get_mut(&el.0).ok_or_else(not_found)?;
        e.value = value.to_string();
        Ok(())
    }

    async fn fill_keystroke(&self, el: &ElementRef, value: &str) -> Result<(), DriverError> {
        self.fill_native(el, value).await
    }

    async fn fill_scripted_dispatch(&self, el: &ElementRef, value: &str) -> Result<(), DriverError> {
        self.fill_native(el, value).await
    }

    async fn read_value(&self, el: &ElementRef) -> Result<String, DriverError> {
        let state = self.state.lock().unwrap();
        Ok(state.elements.get(&el.0).map(|e| e.value.clone()).unwrap_or_default())
    }

    async fn is_native_select(&self, el: &ElementRef) -> Result<bool, DriverError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .elements
            .get(&el.0)
            .map(|e| e.is_native_select)
            .unwrap_or(false))
    }

    async fn select_native_value(&self, el: &ElementRef, option_text: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let e = state.elements.get_mut(&el.0).ok_or_else(not_found)?;
        e.value = option_text.to_string();
        Ok(())
    }

    async fn open_dropdown(&self, _el: &ElementRef) -> Result<(), DriverError> {
        Ok(())
    }

    async fn is_checked(&self, el: &ElementRef) -> Result<bool, DriverError> {
        let state = self.state.lock().unwrap();
        Ok(state.elements.get(&el.0).map(|e| e.checked).unwrap_or(false))
    }

    async fn click_associated_label(&self, el: &ElementRef) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let e = state.elements.get_mut(&el.0).ok_or_else(not_found)?;
        e.checked = !e.checked;
        Ok(())
    }

    async fn upload_via_button(&self, _el: &ElementRef, file_path: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state
            .elements
            .entry("uploaded".to_string())
            .or_default()
            .value = file_path.to_string();
        Ok(())
    }

    async fn upload_via_input(&self, el: &ElementRef, file_path: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let e = state.elements.get_mut(&el.0).ok_or_else(not_found)?;
        e.value = file_path.to_string();
        Ok(())
    }

    async fn text_present(&self, text: &str) -> Result<bool, DriverError> {
        Ok(self.state.lock().unwrap().visible_text.contains(text))
    }

    async fn dom_snapshot(&self) -> Result<String, DriverError> {
        Ok(format!("<html><body>{}</body></html>", self.state.lock().unwrap().visible_text))
    }

    async fn page_fingerprint(&self) -> Result<String, DriverError> {
        Ok("fake-fingerprint".to_string())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        self.state.lock().unwrap().screenshots_taken.push(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn query_returns_registered_match() {
        let driver = FakeDriver::new();
        driver.register_match("button:has-text('Submit')", "submit-btn");
        let result = driver.query("button:has-text('Submit')").await.unwrap();
        assert_eq!(result, Some(ElementRef("submit-btn".to_string())));
    }

    #[tokio::test]
    async fn fill_and_read_round_trip() {
        let driver = FakeDriver::new();
        driver.seed_element("county", FakeElement::default());
        let el = ElementRef("county".to_string());
        driver.fill_native(&el, "Loudoun").await.unwrap();
        assert_eq!(driver.read_value(&el).await.unwrap(), "Loudoun");
    }

    #[tokio::test]
    async fn check_toggles_via_label_click() {
        let driver = FakeDriver::new();
        driver.seed_element("terms", FakeElement::default());
        let el = ElementRef("terms".to_string());
        assert!(!driver.is_checked(&el).await.unwrap());
        driver.click_associated_label(&el).await.unwrap();
        assert!(driver.is_checked(&el).await.unwrap());
    }
}

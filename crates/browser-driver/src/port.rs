//! The hexagonal boundary between the Resolution Engine and a real browser
//! (spec.md's C5/C7 require *some* browser, but never which driver). Every
//! `attempt` sub-strategy in §4.5 is exposed as its own method here so the
//! engine — not the driver — owns the fallback order and short-circuiting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// An opaque reference to a previously matched element. Drivers choose
/// their own encoding (a chromiumoxide `NodeId`, a WebDriver element id,
/// ...); callers never interpret it, only pass it back.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ElementRef(pub String);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MouseButton {
    Left,
}

/// One browser tab/session a [`crate::chromium::ChromiumDriver`] or fake
/// drives. The Parallel Coordinator (C8) opens one per Session so sessions
/// never share browser state (P7).
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// Resolve one candidate selector string (§4.2's rendered `Candidate`)
    /// to an element, waiting up to the per-candidate timeout. `Ok(None)`
    /// means the candidate simply didn't match anything — not an error.
    async fn query(&self, candidate: &str) -> Result<Option<ElementRef>, DriverError>;

    // --- Click sub-strategies (§4.5, attempt/Click), tried in this order ---
    async fn click_standard(&self, el: &ElementRef) -> Result<(), DriverError>;
    async fn click_scripted(&self, el: &ElementRef) -> Result<(), DriverError>;
    async fn click_force(&self, el: &ElementRef) -> Result<(), DriverError>;
    async fn click_synthesized_mouse_event(&self, el: &ElementRef) -> Result<(), DriverError>;

    // --- Fill / FillTextarea sub-strategies (§4.5, attempt/Fill) ---
    async fn is_disabled_or_readonly(&self, el: &ElementRef) -> Result<bool, DriverError>;
    async fn clear_disabled_readonly_attrs(&self, el: &ElementRef) -> Result<(), DriverError>;
    async fn fill_native(&self, el: &ElementRef, value: &str) -> Result<(), DriverError>;
    async fn fill_keystroke(&self, el: &ElementRef, value: &str) -> Result<(), DriverError>;
    async fn fill_scripted_dispatch(&self, el: &ElementRef, value: &str) -> Result<(), DriverError>;
    async fn read_value(&self, el: &ElementRef) -> Result<String, DriverError>;

    // --- Select (§4.2.3, §4.5) ---
    async fn is_native_select(&self, el: &ElementRef) -> Result<bool, DriverError>;
    async fn select_native_value(&self, el: &ElementRef, option_text: &str) -> Result<(), DriverError>;
    async fn open_dropdown(&self, el: &ElementRef) -> Result<(), DriverError>;

    // --- Check (§4.2.4, §4.5) ---
    async fn is_checked(&self, el: &ElementRef) -> Result<bool, DriverError>;
    async fn click_associated_label(&self, el: &ElementRef) -> Result<(), DriverError>;

    // --- Upload (§4.2.4) ---
    /// Activate `el` (a button) and register a one-shot file-chooser
    /// interception that supplies `file_path` when the chooser opens.
    async fn upload_via_button(&self, el: &ElementRef, file_path: &str) -> Result<(), DriverError>;
    /// Set `file_path` directly on an `input[type=file]`.
    async fn upload_via_input(&self, el: &ElementRef, file_path: &str) -> Result<(), DriverError>;

    // --- Verify (§4.2.4) ---
    async fn text_present(&self, text: &str) -> Result<bool, DriverError>;

    // --- Diagnostics / AI adapter support ---
    async fn dom_snapshot(&self) -> Result<String, DriverError>;
    async fn page_fingerprint(&self) -> Result<String, DriverError>;
    async fn screenshot(&self, path: &std::path::Path) -> Result<(), DriverError>;
}

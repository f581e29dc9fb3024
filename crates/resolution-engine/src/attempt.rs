//! Per-action-kind `attempt` sub-strategies (spec.md §4.5). Each one is
//! handed an already-resolved [`ElementRef`] and decides, independent of
//! which candidate string found it, whether the action actually took
//! effect — e.g. a click is only a success once one of four increasingly
//! forceful sub-strategies lands; a fill is only a success once the read-
//! back value matches what was typed.

use async_trait::async_trait;
use browser_driver::{BrowserDriver, DriverError, ElementRef};

/// One action kind's element-level behavior, decoupled from candidate
/// resolution so the outer resolve loop (`engine.rs`) can share one
/// candidate-trial loop across Click/Fill/FillTextarea/Check.
#[async_trait]
pub trait ElementAction: Send + Sync {
    /// `Ok(true)` means the action took effect; `Ok(false)` means every
    /// sub-strategy ran without error but none produced the desired state —
    /// the caller treats this the same as a candidate miss and moves on to
    /// the next candidate (spec.md §9's Open Question on between-candidate
    /// retry: the source tries the next candidate rather than re-running
    /// sub-strategies on the same element, so that is what this does too).
    async fn try_on(&self, driver: &dyn BrowserDriver, el: &ElementRef) -> Result<bool, DriverError>;
}

pub struct ClickAction;

#[async_trait]
impl ElementAction for ClickAction {
    async fn try_on(&self, driver: &dyn BrowserDriver, el: &ElementRef) -> Result<bool, DriverError> {
        if driver.click_standard(el).await.is_ok() {
            return Ok(true);
        }
        if driver.click_scripted(el).await.is_ok() {
            return Ok(true);
        }
        if driver.click_force(el).await.is_ok() {
            return Ok(true);
        }
        if driver.click_synthesized_mouse_event(el).await.is_ok() {
            return Ok(true);
        }
        Ok(false)
    }
}

pub struct FillAction<'a> {
    pub value: &'a str,
}

#[async_trait]
impl<'a> ElementAction for FillAction<'a> {
    async fn try_on(&self, driver: &dyn BrowserDriver, el: &ElementRef) -> Result<bool, DriverError> {
        if driver.is_disabled_or_readonly(el).await.unwrap_or(false) {
            // Best-effort: some component frameworks refuse to accept input
            // while these attributes are set even on an otherwise-editable
            // field (spec.md §4.5). Failure here is not fatal — the fill
            // sub-strategies below are attempted regardless.
            let _ = driver.clear_disabled_readonly_attrs(el).await;
        }

        let _ = driver.fill_native(el, self.value).await;
        if self.matches(driver, el).await {
            return Ok(true);
        }
        let _ = driver.fill_keystroke(el, self.value).await;
        if self.matches(driver, el).await {
            return Ok(true);
        }
        let _ = driver.fill_scripted_dispatch(el, self.value).await;
        Ok(self.matches(driver, el).await)
    }
}

impl<'a> FillAction<'a> {
    async fn matches(&self, driver: &dyn BrowserDriver, el: &ElementRef) -> bool {
        driver
            .read_value(el)
            .await
            .map(|read_back| read_back == self.value)
            .unwrap_or(false)
    }
}

pub struct CheckAction {
    pub desired_state: bool,
}

#[async_trait]
impl ElementAction for CheckAction {
    async fn try_on(&self, driver: &dyn BrowserDriver, el: &ElementRef) -> Result<bool, DriverError> {
        let current = driver.is_checked(el).await?;
        if current == self.desired_state {
            return Ok(true);
        }
        driver.click_associated_label(el).await?;
        let after = driver.is_checked(el).await?;
        Ok(after == self.desired_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_driver::{FakeDriver, FakeElement};

    #[tokio::test]
    async fn click_action_succeeds_via_standard_click() {
        let driver = FakeDriver::new();
        driver.seed_element("btn", FakeElement::default());
        let el = ElementRef("btn".to_string());
        assert!(ClickAction.try_on(&driver, &el).await.unwrap());
    }

    #[tokio::test]
    async fn fill_action_succeeds_when_readback_matches() {
        let driver = FakeDriver::new();
        driver.seed_element("county", FakeElement::default());
        let el = ElementRef("county".to_string());
        let action = FillAction { value: "Loudoun" };
        assert!(action.try_on(&driver, &el).await.unwrap());
        assert_eq!(driver.element("county").unwrap().value, "Loudoun");
    }

    #[tokio::test]
    async fn check_action_no_ops_when_already_in_desired_state() {
        let driver = FakeDriver::new();
        driver.seed_element("terms", FakeElement::default());
        let el = ElementRef("terms".to_string());
        let action = CheckAction { desired_state: false };
        assert!(action.try_on(&driver, &el).await.unwrap());
        assert!(!driver.element("terms").unwrap().checked);
    }

    #[tokio::test]
    async fn check_action_toggles_to_reach_desired_state() {
        let driver = FakeDriver::new();
        driver.seed_element("terms", FakeElement::default());
        let el = ElementRef("terms".to_string());
        let action = CheckAction { desired_state: true };
        assert!(action.try_on(&driver, &el).await.unwrap());
        assert!(driver.element("terms").unwrap().checked);
    }
}

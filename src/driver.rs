use std::ffi::OsStr;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use tracing::{debug, error};

use crate::blocklist;
use crate::config::DriverConfig;
use crate::dom::PageDocument;
use crate::errors::{DriverError, Result};
use crate::js;
use crate::selector::{ElementSelector, SelectorKind};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const NETWORK_IDLE_SETTLE_MS: u64 = 500;
const DEFAULT_SELECT_WAIT_MS: u64 = 1_000;

/// Element state for [`Driver::wait_for_selector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitState {
    #[default]
    Visible,
    Attached,
    Hidden,
    Detached,
}

impl fmt::Display for WaitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaitState::Visible => "visible",
            WaitState::Attached => "attached",
            WaitState::Hidden => "hidden",
            WaitState::Detached => "detached",
        };
        write!(f, "{name}")
    }
}

/// Navigation lifecycle condition for [`Driver::get_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    #[default]
    Load,
    DomContentLoaded,
    NetworkIdle,
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle => "networkidle",
        };
        write!(f, "{name}")
    }
}

/// Owns one browser engine and one page. Interactive operations keep
/// failures local: each one logs the failure with the operation and selector
/// names and returns its own `Result`, so one failed step never poisons the
/// driver or a multi-step script. After [`Driver::close`] every operation
/// fails fast with [`DriverError::Closed`].
pub struct Driver {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    timeout: Duration,
}

impl Driver {
    /// Launches the engine and opens one page. A launch failure is fatal;
    /// there are no retries and no fallback engine family.
    pub async fn create(config: DriverConfig) -> Result<Self> {
        config.validate()?;

        let window_size_arg = format!(
            "--window-size={},{}",
            config.launch.window_size.0, config.launch.window_size.1
        );

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];
        for arg in &config.launch.extra_args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.launch.headless)
            .args(args)
            .user_data_dir(config.persistent_context_dir.clone())
            .build()
            .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| DriverError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;

        let timeout = Duration::from_millis(config.navigation_timeout_ms);
        tab.set_default_timeout(timeout);

        if config.block_resources {
            blocklist::register(&tab)?;
        }

        debug!(
            browser_type = ?config.browser_type,
            headless = config.launch.headless,
            persistent = config.persistent_context_dir.is_some(),
            "browser launched"
        );

        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
            timeout,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tab.is_none()
    }

    /// Whether any element matches the selector in the page or the given
    /// sub-frame. Every failure, including a closed driver, collapses to
    /// `false` plus a log line.
    pub async fn exists(&self, el: &ElementSelector, frame: Option<&ElementSelector>) -> bool {
        debug!(selector = el.name(), in_frame = frame.is_some(), "checking element presence");
        match self.eval(&js::count_script(el, frame)) {
            Ok(value) => {
                let count = value.as_i64().unwrap_or(-1);
                if count < 0 {
                    error!(
                        operation = "exists",
                        selector = el.name(),
                        "containing frame not found"
                    );
                    return false;
                }
                debug!(selector = el.name(), count, "element count");
                count > 0
            }
            Err(e) => {
                error!(operation = "exists", selector = el.name(), error = %e, "operation failed");
                false
            }
        }
    }

    /// Waits for the selector to become visible, selects the option with the
    /// given value, then pauses for `wait_after` (default 1 second).
    pub async fn select_option(
        &self,
        el: &ElementSelector,
        option: &str,
        frame: Option<&ElementSelector>,
        wait_after: Option<u64>,
    ) -> Result<()> {
        let result = self.select_option_inner(el, option, frame).await;
        match &result {
            Ok(()) => {
                debug!(selector = el.name(), option, "option selected");
                self.pause(wait_after.unwrap_or(DEFAULT_SELECT_WAIT_MS)).await;
            }
            Err(e) => {
                error!(operation = "select_option", selector = el.name(), error = %e, "operation failed");
            }
        }
        result
    }

    async fn select_option_inner(
        &self,
        el: &ElementSelector,
        option: &str,
        frame: Option<&ElementSelector>,
    ) -> Result<()> {
        self.wait_for_state(el, WaitState::Visible, frame, None).await?;
        let selected = self
            .eval(&js::select_option_script(el, option, frame))?
            .as_bool()
            .unwrap_or(false);
        if !selected {
            return Err(DriverError::ElementNotFound(format!(
                "option '{}' on selector '{}'",
                option,
                el.name()
            )));
        }
        Ok(())
    }

    /// Clicks the element. The timeout defaults to the configured navigation
    /// timeout; `wait_after` pauses after a successful click.
    pub async fn click(
        &self,
        el: &ElementSelector,
        wait_after: Option<u64>,
        frame: Option<&ElementSelector>,
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        debug!(selector = el.name(), in_frame = frame.is_some(), "clicking element");
        let result = self.click_inner(el, frame, timeout_ms).await;
        match &result {
            Ok(()) => {
                debug!(selector = el.name(), "element clicked");
                if let Some(ms) = wait_after {
                    self.pause(ms).await;
                }
            }
            Err(e) => {
                error!(operation = "click", selector = el.name(), error = %e, "operation failed");
            }
        }
        result
    }

    async fn click_inner(
        &self,
        el: &ElementSelector,
        frame: Option<&ElementSelector>,
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        // Page-level CSS goes through the engine's native element lookup;
        // XPath and frame-scoped targets resolve through the DOM.
        if el.kind() == SelectorKind::Css && frame.is_none() {
            let tab = self.tab()?;
            let element = tab
                .wait_for_element_with_custom_timeout(el.query(), self.op_timeout(timeout_ms))
                .map_err(|e| {
                    DriverError::ElementNotFound(format!("'{}': {e}", el.name()))
                })?;
            element
                .click()
                .map_err(|e| DriverError::JavaScriptFailed(e.to_string()))?;
            return Ok(());
        }

        self.wait_for_state(el, WaitState::Visible, frame, timeout_ms).await?;
        let clicked = self
            .eval(&js::click_script(el, frame))?
            .as_bool()
            .unwrap_or(false);
        if !clicked {
            return Err(DriverError::ElementNotFound(format!("'{}'", el.name())));
        }
        Ok(())
    }

    /// Sets the element's value to `value`, firing the input and change
    /// events. Same timeout and wait semantics as [`Driver::click`].
    pub async fn fill(
        &self,
        el: &ElementSelector,
        value: &str,
        wait_after: Option<u64>,
        frame: Option<&ElementSelector>,
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        debug!(selector = el.name(), in_frame = frame.is_some(), "filling element");
        let result = self.fill_inner(el, value, frame, timeout_ms).await;
        match &result {
            Ok(()) => {
                debug!(selector = el.name(), "element filled");
                if let Some(ms) = wait_after {
                    self.pause(ms).await;
                }
            }
            Err(e) => {
                error!(operation = "fill", selector = el.name(), error = %e, "operation failed");
            }
        }
        result
    }

    async fn fill_inner(
        &self,
        el: &ElementSelector,
        value: &str,
        frame: Option<&ElementSelector>,
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        self.wait_for_state(el, WaitState::Visible, frame, timeout_ms).await?;
        let filled = self
            .eval(&js::fill_script(el, value, frame))?
            .as_bool()
            .unwrap_or(false);
        if !filled {
            return Err(DriverError::ElementNotFound(format!("'{}'", el.name())));
        }
        Ok(())
    }

    /// Blocks until the element reaches the requested state or the timeout
    /// elapses.
    pub async fn wait_for_selector(
        &self,
        el: &ElementSelector,
        state: WaitState,
        frame: Option<&ElementSelector>,
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let result = self.wait_for_state(el, state, frame, timeout_ms).await;
        match &result {
            Ok(()) => debug!(selector = el.name(), %state, "element reached state"),
            Err(e) => {
                error!(operation = "wait_for_selector", selector = el.name(), error = %e, "operation failed");
            }
        }
        result
    }

    async fn wait_for_state(
        &self,
        el: &ElementSelector,
        state: WaitState,
        frame: Option<&ElementSelector>,
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let timeout = self.op_timeout(timeout_ms);
        let script = js::state_script(el, frame, state);
        let start = Instant::now();
        loop {
            if self.eval(&script)?.as_bool() == Some(true) {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(DriverError::WaitTimeout(format!(
                    "selector '{}' to become {state}",
                    el.name()
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Navigates to `url`, waits for the lifecycle condition, optionally
    /// waits for a selector and pauses, then returns the full serialized
    /// page markup.
    pub async fn get_page(
        &self,
        url: &str,
        wait_el: Option<&ElementSelector>,
        wait_after: u64,
        wait_until: WaitUntil,
        timeout_ms: Option<u64>,
    ) -> Result<String> {
        let result = self
            .get_page_inner(url, wait_el, wait_after, wait_until, timeout_ms)
            .await;
        if let Err(e) = &result {
            error!(operation = "get_page", url, error = %e, "operation failed");
        }
        result
    }

    async fn get_page_inner(
        &self,
        url: &str,
        wait_el: Option<&ElementSelector>,
        wait_after: u64,
        wait_until: WaitUntil,
        timeout_ms: Option<u64>,
    ) -> Result<String> {
        debug!(url, %wait_until, "navigating");
        let timeout = self.op_timeout(timeout_ms);

        {
            let tab = self.tab()?;
            tab.navigate_to(url)
                .map_err(|e| DriverError::NavigationFailed(e.to_string()))?;
            tab.wait_until_navigated()
                .map_err(|e| DriverError::NavigationFailed(e.to_string()))?;
        }

        self.wait_for_lifecycle(wait_until, timeout).await?;

        if let Some(el) = wait_el {
            self.wait_for_state(el, WaitState::Visible, None, timeout_ms).await?;
        }
        if wait_after > 0 {
            self.pause(wait_after).await;
        }

        let content = self
            .tab()?
            .get_content()
            .map_err(|e| DriverError::DomExtractionFailed(e.to_string()))?;
        debug!(url, bytes = content.len(), "navigation complete");
        Ok(content)
    }

    async fn wait_for_lifecycle(&self, wait_until: WaitUntil, timeout: Duration) -> Result<()> {
        let script = js::ready_state_script(wait_until);
        let start = Instant::now();
        loop {
            if self.eval(script)?.as_bool() == Some(true) {
                break;
            }
            if start.elapsed() >= timeout {
                return Err(DriverError::WaitTimeout(format!(
                    "page to reach '{wait_until}' state"
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        if wait_until == WaitUntil::NetworkIdle {
            self.pause(NETWORK_IDLE_SETTLE_MS).await;
        }
        Ok(())
    }

    /// Re-parses the current page markup into an offline queryable document,
    /// independent of the live engine.
    pub async fn document(&self) -> Result<PageDocument> {
        let content = self
            .tab()?
            .get_content()
            .map_err(|e| DriverError::DomExtractionFailed(e.to_string()))?;
        Ok(PageDocument::parse(&content))
    }

    pub fn current_url(&self) -> Result<String> {
        Ok(self.tab()?.get_url())
    }

    pub async fn title(&self) -> Result<String> {
        Ok(self
            .eval("document.title")?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    /// Runs a JavaScript expression in the page and returns its JSON value.
    pub async fn evaluate(&self, script: &str) -> Result<Value> {
        self.eval(script)
    }

    pub async fn reload(&self) -> Result<()> {
        self.tab()?
            .reload(false, None)
            .map_err(|e| DriverError::NavigationFailed(e.to_string()))?;
        Ok(())
    }

    /// Best-effort release of page then engine, each attempt independent of
    /// the other's outcome. Logs failures, never raises; idempotent.
    pub async fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        debug!("closing driver");
        if let Some(tab) = self.tab.take() {
            if let Err(e) = tab.close(true) {
                error!(operation = "close", error = %e, "page release failed");
            }
        }
        if let Some(browser) = self.browser.take() {
            drop(browser);
            debug!("engine released");
        }
    }

    fn tab(&self) -> Result<&Arc<Tab>> {
        self.tab.as_ref().ok_or(DriverError::Closed)
    }

    fn op_timeout(&self, timeout_ms: Option<u64>) -> Duration {
        timeout_ms.map(Duration::from_millis).unwrap_or(self.timeout)
    }

    fn eval(&self, script: &str) -> Result<Value> {
        let result = self
            .tab()?
            .evaluate(script, false)
            .map_err(|e| DriverError::JavaScriptFailed(e.to_string()))?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    async fn pause(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_state_display_matches_engine_vocabulary() {
        assert_eq!(WaitState::Visible.to_string(), "visible");
        assert_eq!(WaitState::Attached.to_string(), "attached");
        assert_eq!(WaitState::Hidden.to_string(), "hidden");
        assert_eq!(WaitState::Detached.to_string(), "detached");
        assert_eq!(WaitState::default(), WaitState::Visible);
    }

    #[test]
    fn wait_until_display_and_default() {
        assert_eq!(WaitUntil::Load.to_string(), "load");
        assert_eq!(WaitUntil::DomContentLoaded.to_string(), "domcontentloaded");
        assert_eq!(WaitUntil::NetworkIdle.to_string(), "networkidle");
        assert_eq!(WaitUntil::default(), WaitUntil::Load);
    }
}

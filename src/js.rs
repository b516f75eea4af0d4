//! Snippet builders for the JavaScript the driver evaluates in the page.
//!
//! Frame-scoped and XPath lookups have no native call in the engine API, so
//! they resolve through the DOM directly: the root is either `document` or
//! the content document of the iframe named by the frame selector.

use crate::driver::{WaitState, WaitUntil};
use crate::selector::{ElementSelector, SelectorKind};

pub(crate) fn js_string(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
}

/// Expression yielding the document to query: the page document, or the
/// content document of the iframe named by `frame` (null when the iframe is
/// missing or cross-origin).
fn root_expr(frame: Option<&ElementSelector>) -> String {
    let Some(frame) = frame else {
        return "document".to_string();
    };
    let lookup = match frame.kind() {
        SelectorKind::Css => format!("document.querySelector('{}')", js_string(frame.query())),
        SelectorKind::XPath => format!(
            "document.evaluate('{}', document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
            js_string(frame.query())
        ),
    };
    format!(
        r#"(function() {{
            const f = {lookup};
            return f ? (f.contentDocument || (f.contentWindow && f.contentWindow.document) || null) : null;
        }})()"#
    )
}

/// Expression yielding the first element matching `el` under `root`.
fn element_expr(el: &ElementSelector) -> String {
    match el.kind() {
        SelectorKind::Css => format!("root.querySelector('{}')", js_string(el.query())),
        SelectorKind::XPath => format!(
            "root.evaluate('{}', root, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
            js_string(el.query())
        ),
    }
}

/// Number of elements matching `el`; -1 when the containing frame is gone.
pub(crate) fn count_script(el: &ElementSelector, frame: Option<&ElementSelector>) -> String {
    let count = match el.kind() {
        SelectorKind::Css => format!("root.querySelectorAll('{}').length", js_string(el.query())),
        SelectorKind::XPath => format!(
            "root.evaluate('{}', root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
            js_string(el.query())
        ),
    };
    format!(
        r#"(function() {{
            const root = {root};
            if (!root) return -1;
            return {count};
        }})()"#,
        root = root_expr(frame),
    )
}

/// Boolean predicate: has the element reached `state`?
pub(crate) fn state_script(
    el: &ElementSelector,
    frame: Option<&ElementSelector>,
    state: WaitState,
) -> String {
    // A missing frame document means nothing inside it is attached.
    let missing_frame = match state {
        WaitState::Hidden | WaitState::Detached => "true",
        WaitState::Visible | WaitState::Attached => "false",
    };
    let predicate = match state {
        WaitState::Attached => "return el !== null;".to_string(),
        WaitState::Detached => "return el === null;".to_string(),
        WaitState::Visible => visible_predicate(false),
        WaitState::Hidden => visible_predicate(true),
    };
    format!(
        r#"(function() {{
            const root = {root};
            if (!root) return {missing_frame};
            const el = {element};
            {predicate}
        }})()"#,
        root = root_expr(frame),
        element = element_expr(el),
    )
}

fn visible_predicate(negate: bool) -> String {
    let (absent, found) = if negate {
        ("true", "!visible")
    } else {
        ("false", "visible")
    };
    format!(
        r#"if (!el) return {absent};
            const rect = el.getBoundingClientRect();
            const style = (root.defaultView || window).getComputedStyle(el);
            const visible = rect.width > 0 &&
                rect.height > 0 &&
                style.visibility !== 'hidden' &&
                style.display !== 'none' &&
                parseFloat(style.opacity) > 0;
            return {found};"#
    )
}

/// Clicks the element; false when it (or its frame) is missing.
pub(crate) fn click_script(el: &ElementSelector, frame: Option<&ElementSelector>) -> String {
    format!(
        r#"(function() {{
            const root = {root};
            if (!root) return false;
            const el = {element};
            if (!el) return false;
            el.click();
            return true;
        }})()"#,
        root = root_expr(frame),
        element = element_expr(el),
    )
}

/// Sets the element's value and fires the input/change events frameworks
/// listen on; false when the element (or its frame) is missing.
pub(crate) fn fill_script(
    el: &ElementSelector,
    value: &str,
    frame: Option<&ElementSelector>,
) -> String {
    format!(
        r#"(function() {{
            const root = {root};
            if (!root) return false;
            const el = {element};
            if (!el) return false;
            el.focus();
            el.value = '{value}';
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#,
        root = root_expr(frame),
        element = element_expr(el),
        value = js_string(value),
    )
}

/// Selects the option with the given value; false when the select, the
/// option, or the frame is missing.
pub(crate) fn select_option_script(
    el: &ElementSelector,
    option: &str,
    frame: Option<&ElementSelector>,
) -> String {
    format!(
        r#"(function() {{
            const root = {root};
            if (!root) return false;
            const el = {element};
            if (!el) return false;
            const present = Array.from(el.options || []).some(o => o.value === '{option}');
            if (!present) return false;
            el.value = '{option}';
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#,
        root = root_expr(frame),
        element = element_expr(el),
        option = js_string(option),
    )
}

/// Boolean predicate for the navigation lifecycle condition.
pub(crate) fn ready_state_script(wait_until: WaitUntil) -> &'static str {
    match wait_until {
        WaitUntil::Load | WaitUntil::NetworkIdle => "document.readyState === 'complete'",
        WaitUntil::DomContentLoaded => {
            "document.readyState === 'interactive' || document.readyState === 'complete'"
        }
    }
}

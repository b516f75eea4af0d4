use serde::{Deserialize, Serialize};

/// A named DOM target. `name` is a human-readable identifier used only in
/// log lines; `value` is the selector string the engine interprets.
///
/// Selector sets are defined per use-site (page object pattern):
///
/// ```
/// use pagedriver::ElementSelector;
///
/// fn search_box() -> ElementSelector {
///     ElementSelector::new("search-box", "#q")
/// }
///
/// assert_eq!(search_box().name(), "search-box");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSelector {
    name: String,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Css,
    XPath,
}

impl ElementSelector {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The selector string to hand to a query engine, with any explicit
    /// `xpath=` prefix stripped.
    pub fn query(&self) -> &str {
        self.value
            .strip_prefix("xpath=")
            .unwrap_or(&self.value)
            .trim()
    }

    /// Classifies the selector value. XPath expressions start with `/`, `(`
    /// or an explicit `xpath=` prefix; everything else is treated as CSS.
    pub fn kind(&self) -> SelectorKind {
        let value = self.value.trim();
        if value.starts_with("xpath=") || value.starts_with('/') || value.starts_with('(') {
            SelectorKind::XPath
        } else {
            SelectorKind::Css
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_selectors_are_classified_as_css() {
        for value in ["#q", ".result a", "input[name='q']", "div > span"] {
            let el = ElementSelector::new("el", value);
            assert_eq!(el.kind(), SelectorKind::Css, "value: {value}");
        }
    }

    #[test]
    fn xpath_selectors_are_classified_as_xpath() {
        for value in ["//input[@id='q']", "/html/body/div", "(//a)[1]"] {
            let el = ElementSelector::new("el", value);
            assert_eq!(el.kind(), SelectorKind::XPath, "value: {value}");
        }
    }

    #[test]
    fn explicit_prefix_forces_xpath_and_is_stripped() {
        let el = ElementSelector::new("el", "xpath=//button[text()='Go']");
        assert_eq!(el.kind(), SelectorKind::XPath);
        assert_eq!(el.query(), "//button[text()='Go']");
    }

    #[test]
    fn query_returns_css_value_unchanged() {
        let el = ElementSelector::new("search-box", "#q");
        assert_eq!(el.query(), "#q");
        assert_eq!(el.name(), "search-box");
    }
}

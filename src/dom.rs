use scraper::{Html, Selector};

use crate::errors::{DriverError, Result};
use crate::selector::{ElementSelector, SelectorKind};

/// An offline parse of one markup snapshot, queryable without further
/// engine round-trips. The offline layer understands CSS only; XPath
/// selectors are refused with an explicit error. Live XPath queries go
/// through the driver.
pub struct PageDocument {
    html: Html,
    raw: String,
}

impl PageDocument {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
            raw: markup.to_string(),
        }
    }

    pub fn count(&self, el: &ElementSelector) -> Result<usize> {
        let selector = self.compile(el)?;
        Ok(self.html.select(&selector).count())
    }

    pub fn matches(&self, el: &ElementSelector) -> Result<bool> {
        Ok(self.count(el)? > 0)
    }

    /// Joined, trimmed text of the first matching element.
    pub fn first_text(&self, el: &ElementSelector) -> Result<Option<String>> {
        let selector = self.compile(el)?;
        Ok(self
            .html
            .select(&selector)
            .next()
            .map(|element| collect_text(element)))
    }

    /// Joined, trimmed text of every matching element.
    pub fn texts(&self, el: &ElementSelector) -> Result<Vec<String>> {
        let selector = self.compile(el)?;
        Ok(self.html.select(&selector).map(collect_text).collect())
    }

    /// First value of `attribute` among the matching elements.
    pub fn attr(&self, el: &ElementSelector, attribute: &str) -> Result<Option<String>> {
        let selector = self.compile(el)?;
        Ok(self
            .html
            .select(&selector)
            .find_map(|element| element.value().attr(attribute))
            .map(|value| value.to_string()))
    }

    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|element| collect_text(element))
            .filter(|title| !title.is_empty())
    }

    /// The raw snapshot this document was parsed from.
    pub fn html(&self) -> &str {
        &self.raw
    }

    fn compile(&self, el: &ElementSelector) -> Result<Selector> {
        if el.kind() == SelectorKind::XPath {
            return Err(DriverError::UnsupportedSelector(format!(
                "'{}' is an XPath selector; offline queries support CSS only",
                el.name()
            )));
        }
        Selector::parse(el.query()).map_err(|e| {
            DriverError::UnsupportedSelector(format!("'{}': {e}", el.name()))
        })
    }
}

fn collect_text(element: scraper::ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

//! HTML scraping: link discovery and article extraction.
//!
//! Scraping follows the same two-phase pattern for every site:
//!
//! 1. **Discovery** ([`links`]): find article-shaped links on a listing page
//! 2. **Extraction** ([`article`], [`body`], [`media`]): turn one rendered
//!    article page into an [`Article`](crate::models::Article)
//!
//! # Extraction rules
//!
//! Every field is extracted by an ordered list of plain functions over the
//! [`DomQuery`] capability. The first rule whose value passes the field's
//! validation wins. Rules never share state and never mutate the document.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

pub mod article;
pub mod body;
pub mod links;
pub mod media;

/// Read-only CSS query capability over a parsed document or element.
pub trait DomQuery {
    /// First element matching `selector`, in document order.
    fn query_first(&self, selector: &str) -> Option<ElementRef<'_>>;

    /// All elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<ElementRef<'_>>;
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(s) => Some(s),
        Err(e) => {
            debug!(%selector, error = ?e, "Unparseable selector");
            None
        }
    }
}

impl DomQuery for Html {
    fn query_first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let sel = parse_selector(selector)?;
        self.select(&sel).next()
    }

    fn query_all(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match parse_selector(selector) {
            Some(sel) => self.select(&sel).collect(),
            None => Vec::new(),
        }
    }
}

impl<'a> DomQuery for ElementRef<'a> {
    fn query_first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let sel = parse_selector(selector)?;
        self.select(&sel).next()
    }

    fn query_all(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match parse_selector(selector) {
            Some(sel) => self.select(&sel).collect(),
            None => Vec::new(),
        }
    }
}

/// Whitespace-collapsed text content of an element.
pub fn element_text(el: &ElementRef<'_>) -> String {
    crate::utils::collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Trimmed, non-empty attribute value.
pub fn attr(el: &ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_first_and_all() {
        let doc = Html::parse_document(
            "<html><body><p class='a'>one</p><p class='a'>two</p><div><p>three</p></div></body></html>",
        );
        assert_eq!(doc.query_all("p").len(), 3);
        let first = doc.query_first("p.a").unwrap();
        assert_eq!(element_text(&first), "one");
        assert!(doc.query_first("article").is_none());
    }

    #[test]
    fn test_invalid_selector_yields_nothing() {
        let doc = Html::parse_document("<p>x</p>");
        assert!(doc.query_first("p[").is_none());
        assert!(doc.query_all("::::").is_empty());
    }

    #[test]
    fn test_element_scoped_query() {
        let doc = Html::parse_document(
            "<div id='x'><span>in</span></div><span>out</span>",
        );
        let x = doc.query_first("#x").unwrap();
        let spans = x.query_all("span");
        assert_eq!(spans.len(), 1);
        assert_eq!(element_text(&spans[0]), "in");
    }

    #[test]
    fn test_attr_trims_and_filters_empty() {
        let doc = Html::parse_document("<a href='  /x  ' title=''>x</a>");
        let a = doc.query_first("a").unwrap();
        assert_eq!(attr(&a, "href").as_deref(), Some("/x"));
        assert!(attr(&a, "title").is_none());
    }
}

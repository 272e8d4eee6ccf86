//! Article body extraction.
//!
//! Four tiers, tried in order:
//!
//! 1. Best-scoring article container (score = qualifying paragraphs once
//!    script/style/nav/ad/comment regions are ignored). Needs at least
//!    [`CONTAINER_MIN_PARAGRAPHS`].
//! 2. Every paragraph in the document, exact repeats and boilerplate removed.
//!    Needs at least [`DOCUMENT_MIN_PARAGRAPHS`].
//! 3. Whitespace-collapsed text of the most content-bearing top-level container.
//! 4. [`NO_CONTENT`]. The length gate upstream rejects it.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use tracing::debug;

use super::{DomQuery, element_text};
use crate::models::NO_CONTENT;
use crate::utils::collapse_whitespace;

pub const CONTAINER_MIN_PARAGRAPHS: usize = 3;
pub const DOCUMENT_MIN_PARAGRAPHS: usize = 2;

/// Elements that commonly hold the article body, most specific first.
const CONTAINER_SELECTORS: &[&str] = &[
    "[itemprop='articleBody']",
    "article",
    "[class*='article-body']",
    "[class*='article-content']",
    "[class*='articleBody']",
    "[class*='story-body']",
    "[class*='story-content']",
    "[class*='post-content']",
    "[class*='entry-content']",
    "[class*='content-body']",
    "[role='main']",
    "main",
    "[class*='article']",
    "[class*='story']",
    "#content",
    "[class*='content']",
];

const TOP_LEVEL_SELECTORS: &[&str] = &["main", "article", "[role='main']", "#content", "body"];

const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "aside", "footer", "header", "form", "button", "iframe",
    "svg", "template",
];

const NOISE_WORDS: &[&str] = &[
    "ad", "ads", "advert", "advertisement", "sponsored", "promo", "comment", "comments", "share",
    "sharing", "social", "related", "recommended", "newsletter", "subscribe", "sidebar", "nav",
    "navigation", "footer", "breadcrumb", "breadcrumbs", "outbrain", "taboola", "cookie", "popup",
    "modal",
];

const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(share (this|on)|subscribe|sign up|advertisement|click here|read more|follow us|related:|copyright|©|all rights reserved|we use cookies|this site uses cookies)",
    )
    .expect("valid boilerplate pattern")
});

static PUNCT_OR_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\W_]+$").expect("valid punctuation pattern"));

/// Whether a class/id attribute value marks the element as page chrome.
fn is_noise_attr(value: &str) -> bool {
    value
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .any(|word| NOISE_WORDS.contains(&word.to_lowercase().as_str()))
}

fn is_noise_element(el: &ElementRef<'_>) -> bool {
    let v = el.value();
    NOISE_TAGS.contains(&v.name())
        || v.attr("class").is_some_and(is_noise_attr)
        || v.attr("id").is_some_and(is_noise_attr)
}

/// True if `el` or any ancestor up to (not including) `stop` is page chrome.
fn inside_noise(el: &ElementRef<'_>, stop: Option<&ElementRef<'_>>) -> bool {
    if is_noise_element(el) {
        return true;
    }
    for node in el.ancestors() {
        if stop.is_some_and(|s| s.id() == node.id()) {
            return false;
        }
        if let Some(parent) = ElementRef::wrap(node) {
            if is_noise_element(&parent) {
                return true;
            }
        }
    }
    false
}

fn is_boilerplate(text: &str) -> bool {
    BOILERPLATE.is_match(text) || PUNCT_OR_NUMERIC.is_match(text)
}

/// Qualifying paragraph texts inside a container, in document order.
fn container_paragraphs(container: &ElementRef<'_>, min_len: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    container
        .query_all("p")
        .into_iter()
        .filter(|p| !inside_noise(p, Some(container)))
        .map(|p| element_text(&p))
        .filter(|t| t.chars().count() >= min_len && !is_boilerplate(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// The best-scoring article container and its paragraphs.
pub fn best_container<'a>(doc: &'a Html, min_len: usize) -> Option<(ElementRef<'a>, Vec<String>)> {
    let mut best: Option<(ElementRef<'a>, Vec<String>)> = None;
    for selector in CONTAINER_SELECTORS {
        for el in doc.query_all(selector) {
            if is_noise_element(&el) {
                continue;
            }
            let paragraphs = container_paragraphs(&el, min_len);
            let better = match &best {
                Some((_, current)) => paragraphs.len() > current.len(),
                None => !paragraphs.is_empty(),
            };
            if better {
                best = Some((el, paragraphs));
            }
        }
    }
    best
}

fn document_paragraphs(doc: &Html, min_len: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    doc.query_all("p")
        .into_iter()
        .filter(|p| !inside_noise(p, None))
        .map(|p| element_text(&p))
        .filter(|t| t.chars().count() >= min_len && !is_boilerplate(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Visible text of an element: script/style contents are skipped.
fn visible_text(el: &ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| INVISIBLE_TAGS.contains(&a.value().name()));
        if !hidden {
            parts.push(String::from(&**text));
        }
    }
    collapse_whitespace(&parts.join(" "))
}

fn page_dump(doc: &Html) -> String {
    TOP_LEVEL_SELECTORS
        .iter()
        .filter_map(|s| doc.query_first(s))
        .map(|el| visible_text(&el))
        .max_by_key(|t| t.len())
        .unwrap_or_default()
}

/// Extract the article body text. Never fails; see the module docs.
pub fn extract_body(doc: &Html, min_paragraph_len: usize) -> String {
    if let Some((_, paragraphs)) = best_container(doc, min_paragraph_len) {
        if paragraphs.len() >= CONTAINER_MIN_PARAGRAPHS {
            debug!(paragraphs = paragraphs.len(), "Body from article container");
            return paragraphs.join("\n\n");
        }
    }

    let paragraphs = document_paragraphs(doc, min_paragraph_len);
    if paragraphs.len() >= DOCUMENT_MIN_PARAGRAPHS {
        debug!(paragraphs = paragraphs.len(), "Body from document paragraphs");
        return paragraphs.join("\n\n");
    }

    let dump = page_dump(doc);
    if dump.chars().count() >= min_paragraph_len {
        debug!(chars = dump.len(), "Body from page text dump");
        return dump;
    }
    if !paragraphs.is_empty() {
        return paragraphs.join("\n\n");
    }

    debug!("No body content found");
    NO_CONTENT.to_string()
}

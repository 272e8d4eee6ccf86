//! Article link discovery on listing pages.
//!
//! A link is kept when it resolves to an absolute http(s) URL on the same
//! registrable domain as the listing page, its path looks like an article
//! (date segments, `/news/…`, `/story/…`, numeric id suffixes, long slugs),
//! and it does not hit the denylist (tag/category/author/search/login/feed
//! pages, non-HTML files).
//!
//! Structural selectors run first. If they produce nothing, every anchor on
//! the page is tried before giving up. An empty result is not an error.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::collections::HashSet;
use tracing::{debug, info, instrument};
use url::Url;

use super::{DomQuery, attr};
use crate::models::CandidateUrl;
use crate::utils::registrable_domain;

/// Selectors that usually wrap headline links on news front pages.
const PRIMARY_SELECTORS: &[&str] = &[
    "article a[href]",
    "h1 a[href]",
    "h2 a[href]",
    "h3 a[href]",
    "h4 a[href]",
    "[class*='headline'] a[href]",
    "[class*='article'] a[href]",
    "[class*='story'] a[href]",
    "[class*='card'] a[href]",
    "[class*='teaser'] a[href]",
    "[class*='post'] a[href]",
    "a[href*='/article']",
    "a[href*='/news/']",
    "a[href*='/story']",
    "a[href*='/post']",
    "a[href*='/20']",
];

const SECONDARY_SELECTORS: &[&str] = &["main a[href]", "a[href]"];

static INCLUDE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // /2024/01/15/ or /2024/01/
        r"/(19|20)\d{2}/\d{1,2}(/\d{1,2})?/",
        // /2024-01-15/ style date segment
        r"/(19|20)\d{2}-\d{2}-\d{2}",
        r"/(article|articles|news|story|stories|post|posts|blog|p)/[^/]+",
        // trailing numeric id: -123456, /123456, _123456.html
        r"[-_/]\d{5,}(\.html?)?/?$",
        // long hyphenated slug
        r"/[a-z0-9]+(-[a-z0-9]+){3,}(\.html?)?/?$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid include pattern"))
    .collect()
});

static EXCLUDE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)/(tag|tags|topic|topics|category|categories|section|author|authors|byline|search|login|log-in|signin|sign-in|logout|register|signup|sign-up|subscribe|subscription|newsletter|newsletters|feed|feeds|rss|account|profile|privacy|terms|about|contact|help|careers|advertise)(/|$)",
        r"(?i)\.(jpe?g|png|gif|webp|svg|ico|bmp|pdf|mp4|webm|mov|mp3|wav|zip|gz|css|js|json|xml|rss|txt)$",
        r"(?i)[?&](s|q|query|search|page|replytocom)=",
        r"(?i)/(wp-admin|wp-login|cdn-cgi)/",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid exclude pattern"))
    .collect()
});

/// Whether the URL path looks like an individual article.
pub fn looks_like_article(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    INCLUDE_PATTERNS.iter().any(|re| re.is_match(&path))
}

/// Whether the URL hits the denylist.
pub fn is_excluded(url: &Url) -> bool {
    let path = url.path();
    let with_query = match url.query() {
        Some(q) => format!("{path}?{q}"),
        None => path.to_string(),
    };
    EXCLUDE_PATTERNS
        .iter()
        .any(|re| re.is_match(path) || re.is_match(&with_query))
}

/// Resolve an href against the page URL; `None` for anything unusable.
fn resolve(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }
    let mut url = match base.join(href) {
        Ok(u) => u,
        Err(e) => {
            debug!(%href, error = %e, "Dropping unparseable href");
            return None;
        }
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

fn collect(
    doc: &Html,
    base: &Url,
    domain: &str,
    selectors: &[&str],
    seen: &mut HashSet<String>,
    out: &mut Vec<CandidateUrl>,
) {
    for selector in selectors {
        for el in doc.query_all(selector) {
            let Some(href) = attr(&el, "href") else {
                continue;
            };
            let Some(url) = resolve(base, &href) else {
                continue;
            };
            let same_site = url
                .host_str()
                .map(|h| registrable_domain(h) == domain)
                .unwrap_or(false);
            if !same_site || url.as_str() == base.as_str() {
                continue;
            }
            if !looks_like_article(&url) || is_excluded(&url) {
                continue;
            }
            let key = url.to_string();
            if seen.insert(key.clone()) {
                out.push(CandidateUrl {
                    url: key,
                    domain: domain.to_string(),
                });
            }
        }
    }
}

/// Discover candidate article URLs on a listing page, in discovery order.
#[instrument(level = "info", skip_all, fields(base = %base))]
pub fn discover(doc: &Html, base: &Url) -> Vec<CandidateUrl> {
    let domain = base.host_str().map(registrable_domain).unwrap_or_default();
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    collect(doc, base, &domain, PRIMARY_SELECTORS, &mut seen, &mut candidates);
    if candidates.is_empty() {
        debug!("Primary selectors found nothing; trying all anchors");
        collect(doc, base, &domain, SECONDARY_SELECTORS, &mut seen, &mut candidates);
    }

    info!(count = candidates.len(), %domain, "Discovered candidate article URLs");
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://news.example.com/").unwrap()
    }

    fn urls(found: &[CandidateUrl]) -> Vec<&str> {
        found.iter().map(|c| c.url.as_str()).collect()
    }

    #[test]
    fn test_discovery_precision() {
        let html = r#"<html><body>
            <a href="/news/2024/01/15/headline-123456">Headline</a>
            <a href="/tag/sports/">Sports</a>
            <a href="/login">Log in</a>
            <a href="image.jpg">Image</a>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let found = discover(&doc, &base());
        assert_eq!(
            urls(&found),
            vec!["https://news.example.com/news/2024/01/15/headline-123456"]
        );
        assert_eq!(found[0].domain, "example.com");
    }

    #[test]
    fn test_discovery_dedups_and_keeps_order() {
        let html = r#"<article>
            <h2><a href="/story/first-big-story-here">First</a></h2>
            <a href="/story/first-big-story-here#comments">First again</a>
            <h2><a href="https://www.example.com/2024/02/03/second">Second</a></h2>
        </article>"#;
        let doc = Html::parse_document(html);
        let found = discover(&doc, &base());
        assert_eq!(
            urls(&found),
            vec![
                "https://news.example.com/story/first-big-story-here",
                "https://www.example.com/2024/02/03/second",
            ]
        );
    }

    #[test]
    fn test_discovery_rejects_other_domains() {
        let html = r#"<h2><a href="https://other.org/news/2024/01/15/x-123456">x</a></h2>"#;
        let doc = Html::parse_document(html);
        assert!(discover(&doc, &base()).is_empty());
    }

    #[test]
    fn test_discovery_respects_private_suffixes() {
        let base = Url::parse("https://alice.github.io/").unwrap();
        let html = r#"<h2><a href="https://bob.github.io/news/2024/01/15/other-site-123456">theirs</a></h2>
            <h2><a href="/news/2024/01/15/my-own-story-123456">mine</a></h2>"#;
        let doc = Html::parse_document(html);
        let found = discover(&doc, &base);
        assert_eq!(
            urls(&found),
            vec!["https://alice.github.io/news/2024/01/15/my-own-story-123456"]
        );
        assert_eq!(found[0].domain, "alice.github.io");
    }

    #[test]
    fn test_secondary_pass_finds_plain_links() {
        let html = r#"<ul><li><a href="/world-leaders-meet-for-climate-talks">x</a></li></ul>"#;
        let doc = Html::parse_document(html);
        let found = discover(&doc, &base());
        assert_eq!(
            urls(&found),
            vec!["https://news.example.com/world-leaders-meet-for-climate-talks"]
        );
    }

    #[test]
    fn test_empty_page_is_not_an_error() {
        let doc = Html::parse_document("<html><body><p>nothing</p></body></html>");
        assert!(discover(&doc, &base()).is_empty());
    }

    #[test]
    fn test_non_http_and_fragment_links_are_dropped() {
        let html = r##"<h2><a href="mailto:x@example.com">m</a><a href="#top">t</a>
            <a href="javascript:void(0)">j</a><a href="ftp://example.com/news/a-b">f</a></h2>"##;
        let doc = Html::parse_document(html);
        assert!(discover(&doc, &base()).is_empty());
    }

    #[test]
    fn test_inclusion_and_exclusion_predicates() {
        let u = |p: &str| Url::parse(&format!("https://example.com{p}")).unwrap();
        assert!(looks_like_article(&u("/2024/01/15/budget")));
        assert!(looks_like_article(&u("/politics/budget-vote-12345678")));
        assert!(!looks_like_article(&u("/news/")));
        assert!(!looks_like_article(&u("/login")));
        assert!(is_excluded(&u("/category/world/")));
        assert!(is_excluded(&u("/author/jane-doe")));
        assert!(is_excluded(&u("/news/2024/photo.JPG")));
        assert!(is_excluded(&u("/news/list?page=2")));
        assert!(!is_excluded(&u("/news/2024/01/15/headline-123456")));
    }
}

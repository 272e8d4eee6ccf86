//! Article extraction from a single rendered page.
//!
//! Each field has an ordered list of [`Rule`]s. The first rule whose value
//! passes the field's validation wins; otherwise the field default applies.
//! Body text comes from [`body::extract_body`] and media from
//! [`media::extract_media`]. The finished [`Article`] must clear the
//! minimum-length gate or extraction fails with [`ExtractError::TooShort`].

use chrono::Utc;
use itertools::Itertools;
use scraper::Html;
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use super::{DomQuery, attr, body, element_text, media};
use crate::config::ArchiveConfig;
use crate::error::ExtractError;
use crate::models::{Article, UNKNOWN_AUTHOR, UNTITLED};
use crate::utils::{collapse_whitespace, format_publish_date, parse_publish_date};

/// A single extraction rule: a pure function over the query capability.
pub type Rule = fn(&dyn DomQuery) -> Option<String>;

/// Knobs the extractor takes from the run configuration.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub min_content_length: usize,
    pub min_paragraph_length: usize,
    pub permissive_titles: bool,
    pub keep_markup: bool,
}

impl From<&ArchiveConfig> for ExtractOptions {
    fn from(config: &ArchiveConfig) -> Self {
        Self {
            min_content_length: config.min_content_length,
            min_paragraph_length: config.min_paragraph_length,
            permissive_titles: config.permissive_titles,
            keep_markup: config.save_html,
        }
    }
}

fn text_of(dom: &dyn DomQuery, selector: &str) -> Option<String> {
    dom.query_first(selector)
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
}

fn attr_of(dom: &dyn DomQuery, selector: &str, name: &str) -> Option<String> {
    dom.query_first(selector).and_then(|el| attr(&el, name))
}

/// Objects from JSON-LD blocks whose `@type` is an article type.
fn json_ld_articles(dom: &dyn DomQuery) -> Vec<Value> {
    fn is_article(v: &Value) -> bool {
        let matches = |t: &str| t.ends_with("Article") || t == "BlogPosting" || t == "Report";
        match v.get("@type") {
            Some(Value::String(t)) => matches(t),
            Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).any(matches),
            _ => false,
        }
    }
    fn walk(v: Value, out: &mut Vec<Value>) {
        match v {
            Value::Array(items) => items.into_iter().for_each(|i| walk(i, out)),
            Value::Object(mut map) => {
                if let Some(graph) = map.remove("@graph") {
                    walk(graph, out);
                }
                let obj = Value::Object(map);
                if is_article(&obj) {
                    out.push(obj);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    for script in dom.query_all("script[type='application/ld+json']") {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(&raw) {
            Ok(v) => walk(v, &mut out),
            Err(e) => debug!(error = %e, "Skipping malformed JSON-LD"),
        }
    }
    out
}

fn json_ld_string(dom: &dyn DomQuery, key: &str) -> Option<String> {
    json_ld_articles(dom).iter().find_map(|obj| match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Object(o) => o.get("name").and_then(Value::as_str).map(str::to_string),
        Value::Array(items) => items.iter().find_map(|i| match i {
            Value::String(s) => Some(s.clone()),
            Value::Object(o) => o.get("name").and_then(Value::as_str).map(str::to_string),
            _ => None,
        }),
        _ => None,
    })
}

pub const TITLE_RULES: &[Rule] = &[
    |d: &dyn DomQuery| text_of(d, "article h1"),
    |d: &dyn DomQuery| text_of(d, "h1[class*='title'], h1[class*='headline']"),
    |d: &dyn DomQuery| text_of(d, "h1"),
    |d: &dyn DomQuery| text_of(d, "[itemprop='headline']"),
    |d: &dyn DomQuery| json_ld_string(d, "headline"),
    |d: &dyn DomQuery| attr_of(d, "meta[property='og:title']", "content"),
    |d: &dyn DomQuery| attr_of(d, "meta[name='twitter:title']", "content"),
    |d: &dyn DomQuery| text_of(d, "title").map(|t| strip_site_suffix(&t)),
];

pub const AUTHOR_RULES: &[Rule] = &[
    |d: &dyn DomQuery| attr_of(d, "meta[name='author']", "content"),
    |d: &dyn DomQuery| json_ld_string(d, "author"),
    |d: &dyn DomQuery| text_of(d, "[itemprop='author'] [itemprop='name']"),
    |d: &dyn DomQuery| text_of(d, "[itemprop='author']"),
    |d: &dyn DomQuery| text_of(d, "[rel='author']"),
    |d: &dyn DomQuery| text_of(d, "[class*='author-name'], [class*='author__name']"),
    |d: &dyn DomQuery| text_of(d, "[class*='byline']"),
    |d: &dyn DomQuery| text_of(d, "[class*='author']"),
];

/// Machine-readable sources first, visible text last.
pub const DATE_RULES: &[Rule] = &[
    |d: &dyn DomQuery| attr_of(d, "meta[property='article:published_time']", "content"),
    |d: &dyn DomQuery| json_ld_string(d, "datePublished"),
    |d: &dyn DomQuery| attr_of(d, "[itemprop='datePublished']", "datetime"),
    |d: &dyn DomQuery| attr_of(d, "[itemprop='datePublished']", "content"),
    |d: &dyn DomQuery| attr_of(d, "time[datetime]", "datetime"),
    |d: &dyn DomQuery| {
        attr_of(
            d,
            "meta[name='pubdate'], meta[name='publishdate'], meta[name='date'], meta[name='dc.date']",
            "content",
        )
    },
    |d: &dyn DomQuery| text_of(d, "time"),
    |d: &dyn DomQuery| text_of(d, "[class*='publish'], [class*='dateline']"),
    |d: &dyn DomQuery| text_of(d, "[class*='date']"),
];

fn strip_site_suffix(title: &str) -> String {
    for sep in [" | ", " - ", " — ", " :: "] {
        if let Some((head, _)) = title.rsplit_once(sep) {
            if !head.trim().is_empty() {
                return head.trim().to_string();
            }
        }
    }
    title.to_string()
}

fn first_valid(dom: &dyn DomQuery, rules: &[Rule], accept: impl Fn(&str) -> Option<String>) -> Option<String> {
    rules
        .iter()
        .filter_map(|rule| rule(dom))
        .find_map(|value| accept(&collapse_whitespace(&value)))
}

fn title_within_bounds(title: &str, permissive: bool) -> bool {
    let len = title.chars().count();
    let min_exclusive = if permissive { 0 } else { 10 };
    len > min_exclusive && len <= 300
}

pub fn extract_title(dom: &dyn DomQuery, permissive: bool) -> String {
    first_valid(dom, TITLE_RULES, |t| {
        title_within_bounds(t, permissive).then(|| t.to_string())
    })
    .unwrap_or_else(|| UNTITLED.to_string())
}

fn clean_author(raw: &str) -> Option<String> {
    let mut name = raw.trim();
    if name.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("by ")) {
        name = name[3..].trim();
    }
    if name.starts_with("http://") || name.starts_with("https://") {
        return None;
    }
    let len = name.chars().count();
    (len > 2 && len <= 100).then(|| name.to_string())
}

pub fn extract_author(dom: &dyn DomQuery) -> String {
    first_valid(dom, AUTHOR_RULES, clean_author).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
}

/// Publish date as an ISO-8601 string; the current time when nothing parses.
pub fn extract_publish_date(dom: &dyn DomQuery) -> String {
    first_valid(dom, DATE_RULES, |raw| {
        parse_publish_date(raw).map(|dt| format_publish_date(&dt))
    })
    .unwrap_or_else(|| format_publish_date(&Utc::now().naive_utc()))
}

fn split_keywords(raw: String) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

/// Union of tag links, tag metas and keyword fields, in first-seen order.
pub fn extract_tags(dom: &dyn DomQuery) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for el in dom.query_all("a[rel='tag'], [class*='tags'] a, [class*='tag-list'] a, [class*='topics'] a") {
        tags.push(element_text(&el));
    }
    for el in dom.query_all("meta[property='article:tag']") {
        tags.extend(attr(&el, "content"));
    }
    for el in dom.query_all("meta[name='keywords'], meta[name='news_keywords']") {
        tags.extend(attr(&el, "content").map(split_keywords).unwrap_or_default());
    }
    for obj in json_ld_articles(dom) {
        match obj.get("keywords") {
            Some(Value::String(s)) => tags.extend(split_keywords(s.clone())),
            Some(Value::Array(items)) => {
                tags.extend(items.iter().filter_map(Value::as_str).map(str::to_string))
            }
            _ => {}
        }
    }

    tags.into_iter()
        .map(|t| collapse_whitespace(&t))
        .filter(|t| {
            let len = t.chars().count();
            len > 0 && len < 50
        })
        .unique()
        .collect()
}

/// Extract a structured article from rendered markup.
///
/// # Errors
///
/// [`ExtractError::TooShort`] when the body text is under
/// `options.min_content_length` characters.
#[instrument(level = "info", skip_all, fields(%url))]
pub fn extract(html: &str, url: &str, options: &ExtractOptions) -> Result<Article, ExtractError> {
    let doc = Html::parse_document(html);
    let base = Url::parse(url).ok();

    let body_text = body::extract_body(&doc, options.min_paragraph_length);
    let len = body_text.chars().count();
    if len < options.min_content_length {
        debug!(len, min = options.min_content_length, "Body below minimum length");
        return Err(ExtractError::TooShort {
            len,
            min: options.min_content_length,
        });
    }

    let (images, videos) = match &base {
        Some(base) => media::extract_media(&doc, base, options.min_paragraph_length),
        None => (Vec::new(), Vec::new()),
    };

    let article = Article {
        url: url.to_string(),
        title: extract_title(&doc, options.permissive_titles),
        author: extract_author(&doc),
        publish_date: extract_publish_date(&doc),
        body_text,
        tags: extract_tags(&doc),
        images,
        videos,
        raw_markup: options.keep_markup.then(|| html.to_string()),
        extracted_at: Utc::now(),
    };

    info!(
        title = %article.title,
        chars = len,
        images = article.images.len(),
        videos = article.videos.len(),
        "Extracted article"
    );
    Ok(article)
}

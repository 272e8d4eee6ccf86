//! Date-partitioned entry folder naming.
//!
//! Entries live at `articles/{year}/{month-name}/{day}/{slug}-{disambiguator}`
//! relative to the domain root. The disambiguator is the compact publish
//! timestamp (`yyyyMMdd-HHmmss`) when the publish time is not exactly
//! midnight, otherwise the first [`HASH_SUFFIX_LEN`] hex chars of the
//! article id. Midnight is read as "no time of day known".

use chrono::{Datelike, NaiveDateTime, NaiveTime};

use crate::models::{Article, EntryMetadata};
use crate::utils::{MAX_SLUG_LEN, month_name, parse_publish_date, slugify_title};

pub const ARTICLES_DIR: &str = "articles";
pub const HASH_SUFFIX_LEN: usize = 8;

/// Timestamp used for partitioning: the parsed publish date, else extraction time.
pub fn partition_time(article: &Article) -> NaiveDateTime {
    parse_publish_date(&article.publish_date).unwrap_or_else(|| article.extracted_at.naive_utc())
}

/// Same rule for an already-committed entry's metadata.
pub fn partition_time_of(metadata: &EntryMetadata) -> NaiveDateTime {
    parse_publish_date(&metadata.publish_date).unwrap_or_else(|| metadata.scraped_at.naive_utc())
}

pub fn disambiguator(article: &Article, published: &NaiveDateTime) -> String {
    if published.time() != NaiveTime::MIN {
        published.format("%Y%m%d-%H%M%S").to_string()
    } else {
        article.id()[..HASH_SUFFIX_LEN].to_string()
    }
}

/// Entry folder relative to the domain root, `/`-separated.
pub fn entry_folder(article: &Article) -> String {
    let published = partition_time(article);
    format!(
        "{ARTICLES_DIR}/{}/{}/{:02}/{}-{}",
        published.year(),
        month_name(published.month()),
        published.day(),
        slugify_title(&article.title, MAX_SLUG_LEN),
        disambiguator(article, &published)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(url: &str, title: &str, date: &str) -> Article {
        Article {
            url: url.to_string(),
            title: title.to_string(),
            author: "Unknown".to_string(),
            publish_date: date.to_string(),
            body_text: String::new(),
            tags: vec![],
            images: vec![],
            videos: vec![],
            raw_markup: None,
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn test_same_day_distinct_times_get_distinct_folders() {
        let a = article("https://e.com/1", "Storm Hits Coast", "2024-01-15T09:00:00");
        let b = article("https://e.com/2", "Storm Hits Coast", "2024-01-15T17:45:30");
        let fa = entry_folder(&a);
        let fb = entry_folder(&b);
        assert_eq!(fa, "articles/2024/january/15/storm-hits-coast-20240115-090000");
        assert_eq!(fb, "articles/2024/january/15/storm-hits-coast-20240115-174530");
    }

    #[test]
    fn test_midnight_uses_hash_suffix() {
        let a = article("https://e.com/1", "Storm Hits Coast", "2024-01-15");
        let folder = entry_folder(&a);
        let suffix = &a.id()[..HASH_SUFFIX_LEN];
        assert_eq!(folder, format!("articles/2024/january/15/storm-hits-coast-{suffix}"));
        assert_eq!(partition_time(&a).time(), NaiveTime::MIN);
    }

    #[test]
    fn test_unparseable_date_falls_back_to_extraction_time() {
        let a = article("https://e.com/1", "Storm", "sometime last week");
        let expected_year = a.extracted_at.year();
        assert!(entry_folder(&a).starts_with(&format!("articles/{expected_year}/")));
    }
}

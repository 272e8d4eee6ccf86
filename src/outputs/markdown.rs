//! Human-readable renderings of a committed entry.
//!
//! - [`article_to_markdown`]: the `article.md` file
//! - [`entry_readme`]: the short plaintext `README.txt` manifest

use std::fmt::Write;

use crate::models::{MediaKind, StoredArticle, VideoKind};

/// Render an entry as Markdown: headline, metadata, tags, body, media.
pub fn article_to_markdown(stored: &StoredArticle) -> String {
    let article = &stored.article;
    let mut md = String::new();

    writeln!(md, "# {}\n", article.title).ok();
    writeln!(md, "- **Author:** {}", article.author).ok();
    writeln!(md, "- **Published:** {}", article.publish_date).ok();
    writeln!(md, "- **Source:** <{}>", article.url).ok();
    writeln!(md, "- **Words:** {}", stored.word_count).ok();
    writeln!(md, "- **Archived:** {}", article.extracted_at.to_rfc3339()).ok();

    if !article.tags.is_empty() {
        let tags = article
            .tags
            .iter()
            .map(|t| format!("`{t}`"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(md, "- **Tags:** {tags}").ok();
    }
    md.push('\n');

    for paragraph in article.body_text.split("\n\n") {
        writeln!(md, "{}\n", paragraph.trim()).ok();
    }

    let images: Vec<_> = stored
        .media
        .iter()
        .filter(|m| m.kind == MediaKind::Image)
        .collect();
    if !article.images.is_empty() {
        writeln!(md, "## Images\n").ok();
        for img in &article.images {
            let label = if img.alt.is_empty() { "image" } else { img.alt.as_str() };
            // link the archived copy when there is one
            let target = images
                .iter()
                .find(|m| m.source_url == img.url)
                .map(|m| relative_to_entry(&stored.folder_path, &m.local_relative_path))
                .unwrap_or_else(|| img.url.clone());
            writeln!(md, "![{label}]({target})").ok();
        }
        md.push('\n');
    }

    if !article.videos.is_empty() {
        writeln!(md, "## Videos\n").ok();
        for video in &article.videos {
            let kind = match video.kind {
                VideoKind::File => "file",
                VideoKind::Embed => "embed",
            };
            writeln!(md, "- [{kind}]({})", video.url).ok();
        }
        md.push('\n');
    }

    md
}

/// Path of a media file relative to its entry folder when it lives inside it.
fn relative_to_entry(folder: &str, media_path: &str) -> String {
    media_path
        .strip_prefix(folder)
        .map(|rest| rest.trim_start_matches('/').to_string())
        .unwrap_or_else(|| media_path.to_string())
}

/// Short plaintext manifest describing what the entry folder holds.
pub fn entry_readme(stored: &StoredArticle, files: &[&str]) -> String {
    let article = &stored.article;
    let mut out = String::new();
    writeln!(out, "{}", article.title).ok();
    writeln!(out, "{}", "=".repeat(article.title.chars().count().min(80))).ok();
    writeln!(out).ok();
    writeln!(out, "ID:        {}", stored.id).ok();
    writeln!(out, "URL:       {}", article.url).ok();
    writeln!(out, "Author:    {}", article.author).ok();
    writeln!(out, "Published: {}", article.publish_date).ok();
    writeln!(out, "Archived:  {}", article.extracted_at.to_rfc3339()).ok();
    writeln!(out, "Words:     {}", stored.word_count).ok();
    writeln!(out).ok();
    writeln!(out, "Files:").ok();
    for f in files {
        writeln!(out, "  {f}").ok();
    }
    if !stored.media.is_empty() {
        writeln!(out, "  media/ ({} files)", stored.media.len()).ok();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, ImageRef, MediaAsset, VideoRef};
    use chrono::Utc;

    fn stored() -> StoredArticle {
        let article = Article {
            url: "https://example.com/news/a".to_string(),
            title: "Council Approves Budget".to_string(),
            author: "Jane Reporter".to_string(),
            publish_date: "2024-01-15T14:30:00".to_string(),
            body_text: "First paragraph.\n\nSecond paragraph.".to_string(),
            tags: vec!["politics".to_string()],
            images: vec![
                ImageRef {
                    url: "https://example.com/a.jpg".to_string(),
                    alt: "Chamber".to_string(),
                    title: String::new(),
                },
                ImageRef {
                    url: "https://example.com/b.jpg".to_string(),
                    alt: String::new(),
                    title: String::new(),
                },
            ],
            videos: vec![VideoRef {
                url: "https://www.youtube.com/embed/x".to_string(),
                kind: VideoKind::Embed,
            }],
            raw_markup: None,
            extracted_at: Utc::now(),
        };
        StoredArticle {
            id: article.id(),
            folder_path: "articles/2024/january/15/council".to_string(),
            word_count: article.word_count(),
            media: vec![MediaAsset {
                source_url: "https://example.com/a.jpg".to_string(),
                local_relative_path: "articles/2024/january/15/council/media/image_1.jpg".to_string(),
                kind: MediaKind::Image,
            }],
            article,
        }
    }

    #[test]
    fn test_markdown_rendering() {
        let md = article_to_markdown(&stored());
        assert!(md.starts_with("# Council Approves Budget\n"));
        assert!(md.contains("- **Author:** Jane Reporter"));
        assert!(md.contains("`politics`"));
        assert!(md.contains("First paragraph.\n\nSecond paragraph."));
        assert!(md.contains("![Chamber](media/image_1.jpg)"));
        assert!(md.contains("![image](https://example.com/b.jpg)"));
        assert!(md.contains("- [embed](https://www.youtube.com/embed/x)"));
    }

    #[test]
    fn test_readme_lists_files() {
        let readme = entry_readme(&stored(), &["article.json", "article.md"]);
        assert!(readme.contains("URL:       https://example.com/news/a"));
        assert!(readme.contains("  article.json\n  article.md\n"));
        assert!(readme.contains("media/ (1 files)"));
    }
}

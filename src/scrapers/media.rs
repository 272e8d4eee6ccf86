//! Image and video references inside an article.
//!
//! Media is collected from the article container first; the whole document is
//! only scanned when the container has none. Icons (explicit width and height
//! both under [`ICON_MAX_PX`]) are skipped. Iframes pointing at known video
//! hosts become [`VideoKind::Embed`] references and are never downloaded.

use itertools::Itertools;
use scraper::{ElementRef, Html};
use url::Url;

use super::body::best_container;
use super::{DomQuery, attr};
use crate::models::{ImageRef, VideoKind, VideoRef};

pub const ICON_MAX_PX: u32 = 100;

const IMAGE_SRC_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src", "data-original"];

const EMBED_HOSTS: &[&str] = &[
    "youtube.com",
    "youtube-nocookie.com",
    "youtu.be",
    "vimeo.com",
    "dailymotion.com",
    "dai.ly",
    "twitch.tv",
    "jwplayer.com",
    "jwplatform.com",
    "brightcove.net",
    "wistia.com",
    "wistia.net",
    "streamable.com",
];

fn resolve(base: &Url, raw: &str) -> Option<String> {
    if raw.starts_with("data:") {
        return None;
    }
    let url = base.join(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

fn dimension(el: &ElementRef<'_>, name: &str) -> Option<u32> {
    let raw = attr(el, name)?;
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn is_icon(el: &ElementRef<'_>) -> bool {
    match (dimension(el, "width"), dimension(el, "height")) {
        (Some(w), Some(h)) => w < ICON_MAX_PX && h < ICON_MAX_PX,
        _ => false,
    }
}

fn image_source(el: &ElementRef<'_>) -> Option<String> {
    IMAGE_SRC_ATTRS
        .iter()
        .find_map(|name| attr(el, name).filter(|v| !v.starts_with("data:")))
        .or_else(|| {
            // first candidate of a srcset
            attr(el, "srcset").and_then(|s| {
                s.split(',')
                    .next()
                    .and_then(|c| c.split_whitespace().next())
                    .map(str::to_string)
            })
        })
}

fn images_in<Q: DomQuery + ?Sized>(scope: &Q, base: &Url) -> Vec<ImageRef> {
    scope
        .query_all("img")
        .iter()
        .filter(|el| !is_icon(el))
        .filter_map(|el| {
            let url = resolve(base, &image_source(el)?)?;
            Some(ImageRef {
                url,
                alt: attr(el, "alt").unwrap_or_default(),
                title: attr(el, "title").unwrap_or_default(),
            })
        })
        .unique_by(|img| img.url.clone())
        .collect()
}

/// Whether an iframe source is a recognized video player.
pub fn is_embed_host(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .is_some_and(|host| {
            EMBED_HOSTS
                .iter()
                .any(|h| host == *h || host.ends_with(&format!(".{h}")))
        })
}

fn videos_in<Q: DomQuery + ?Sized>(scope: &Q, base: &Url) -> Vec<VideoRef> {
    let files = scope
        .query_all("video[src], video source[src]")
        .into_iter()
        .filter_map(|el| resolve(base, &attr(&el, "src")?))
        .map(|url| VideoRef {
            url,
            kind: VideoKind::File,
        });
    let embeds = scope
        .query_all("iframe[src], iframe[data-src]")
        .into_iter()
        .filter_map(|el| resolve(base, &attr(&el, "src").or_else(|| attr(&el, "data-src"))?))
        .filter(|url| is_embed_host(url))
        .map(|url| VideoRef {
            url,
            kind: VideoKind::Embed,
        });
    files
        .chain(embeds)
        .unique_by(|v| v.url.clone())
        .collect()
}

/// Collect image and video references, preferring the article container.
pub fn extract_media(doc: &Html, base: &Url, min_paragraph_len: usize) -> (Vec<ImageRef>, Vec<VideoRef>) {
    let container = best_container(doc, min_paragraph_len).map(|(el, _)| el);

    let mut images = container
        .as_ref()
        .map(|c| images_in(c, base))
        .unwrap_or_default();
    if images.is_empty() {
        images = images_in(doc, base);
    }

    let mut videos = container
        .as_ref()
        .map(|c| videos_in(c, base))
        .unwrap_or_default();
    if videos.is_empty() {
        videos = videos_in(doc, base);
    }

    (images, videos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://news.example.com/news/2024/01/15/story").unwrap()
    }

    const BODY: &str = "<p>Paragraph one carries enough words to count as article text.</p>";

    #[test]
    fn test_in_content_images_win() {
        let html = format!(
            "<img src='/logo.png'><article>{BODY}<img src='/media/photo.jpg' alt='Photo' title='T'>\
             <img src='/media/photo.jpg'><img src='/icons/x.png' width='16' height='16'></article>"
        );
        let doc = Html::parse_document(&html);
        let (images, _) = extract_media(&doc, &base(), 40);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "https://news.example.com/media/photo.jpg");
        assert_eq!(images[0].alt, "Photo");
        assert_eq!(images[0].title, "T");
    }

    #[test]
    fn test_whole_document_fallback() {
        let html = format!(
            "<article>{BODY}</article><div><img data-src='https://cdn.example.com/a.webp'></div>"
        );
        let doc = Html::parse_document(&html);
        let (images, _) = extract_media(&doc, &base(), 40);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "https://cdn.example.com/a.webp");
    }

    #[test]
    fn test_icon_needs_both_dimensions_small() {
        let html = "<img src='/a.png' width='50'><img src='/b.png' width='50' height='300'><img src='/c.png' width='99px' height='20'>";
        let doc = Html::parse_document(html);
        let (images, _) = extract_media(&doc, &base(), 40);
        let urls: Vec<_> = images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://news.example.com/a.png", "https://news.example.com/b.png"]
        );
    }

    #[test]
    fn test_videos_files_and_embeds() {
        let html = format!(
            "<article>{BODY}<video src='/v/clip.mp4'></video>\
             <iframe src='https://www.youtube.com/embed/abc123'></iframe>\
             <iframe src='https://ads.example.net/frame'></iframe></article>"
        );
        let doc = Html::parse_document(&html);
        let (_, videos) = extract_media(&doc, &base(), 40);
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].kind, VideoKind::File);
        assert_eq!(videos[0].url, "https://news.example.com/v/clip.mp4");
        assert_eq!(videos[1].kind, VideoKind::Embed);
    }

    #[test]
    fn test_data_uris_and_srcset() {
        let html = "<img src='data:image/gif;base64,R0lGOD'><img srcset='/s-480.jpg 480w, /s-800.jpg 800w'>";
        let doc = Html::parse_document(html);
        let (images, _) = extract_media(&doc, &base(), 40);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "https://news.example.com/s-480.jpg");
    }

    #[test]
    fn test_embed_hosts() {
        assert!(is_embed_host("https://player.vimeo.com/video/1"));
        assert!(is_embed_host("https://www.youtube-nocookie.com/embed/x"));
        assert!(!is_embed_host("https://notyoutube.com/embed/x"));
    }
}

//! Spreadsheet export (`articles.csv`).
//!
//! Column order is fixed; downstream readers rely on it.

use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::error::StoreError;
use crate::models::ArchiveEntry;

pub const HEADERS: [&str; 11] = [
    "id",
    "publishDate",
    "title",
    "author",
    "url",
    "wordCount",
    "tags",
    "imageCount",
    "videoCount",
    "folderPath",
    "scrapedAt",
];

/// Render entries as CSV bytes.
pub fn entries_to_csv(entries: &[ArchiveEntry]) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for entry in entries {
        let m = &entry.metadata;
        writer.write_record([
            entry.id.as_str(),
            m.publish_date.as_str(),
            m.title.as_str(),
            m.author.as_str(),
            m.url.as_str(),
            &m.word_count.to_string(),
            &m.tags.join("; "),
            &m.image_count.to_string(),
            &m.video_count.to_string(),
            entry.folder_path.as_str(),
            &m.scraped_at.to_rfc3339(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| StoreError::Io(e.into_error()))
}

#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = entries.len()))]
pub async fn write_csv(path: &Path, entries: &[ArchiveEntry]) -> Result<(), StoreError> {
    let bytes = entries_to_csv(entries)?;
    fs::write(path, bytes).await?;
    info!("Wrote spreadsheet");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryMetadata;
    use chrono::Utc;

    #[test]
    fn test_csv_columns_and_quoting() {
        let entry = ArchiveEntry {
            id: "abc".to_string(),
            folder_path: "articles/2024/january/15/x-abc".to_string(),
            metadata: EntryMetadata {
                url: "https://example.com/x".to_string(),
                title: "Hello, \"World\"".to_string(),
                author: "Jane".to_string(),
                publish_date: "2024-01-15T00:00:00".to_string(),
                word_count: 12,
                tags: vec!["a".to_string(), "b".to_string()],
                image_count: 1,
                video_count: 0,
                scraped_at: Utc::now(),
            },
            media_manifest: vec![],
        };
        let bytes = entries_to_csv(&[entry]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,publishDate,title,author,url,wordCount,tags,imageCount,videoCount,folderPath,scrapedAt"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("abc,2024-01-15T00:00:00,\"Hello, \"\"World\"\"\",Jane,https://example.com/x,12,a; b,1,0,"));

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.len(), HEADERS.len());
        assert_eq!(&record[2], "Hello, \"World\"");
    }
}

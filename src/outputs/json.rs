//! JSON dump of the crawl result.
//!
//! The whole [`CrawlResult`](crate::models::CrawlResult) is written once, at
//! the end of a run, as a single array:
//!
//! ```json
//! [
//!     {
//!         "title": "…",
//!         "content": "…",
//!         "category": "sport",
//!         "photos": 3,
//!         "date": "12. března 2024",
//!         "comments": 42
//!     }
//! ]
//! ```
//!
//! Non-ASCII text (Czech diacritics) is written as-is, not `\u` escaped.

use crate::models::Article;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize articles as a 4-space indented JSON array.
pub fn articles_to_json(articles: &[Article]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    articles.serialize(&mut serializer)?;
    Ok(buf)
}

/// Write articles to `path`, replacing any existing file.
///
/// The parent directory is created if it does not exist.
///
/// # Arguments
///
/// * `path` - Destination file, e.g. `datas.json`
/// * `articles` - The records to dump
///
/// # Returns
///
/// `Ok(())` on success, or an error if serialization, directory creation,
/// or the write itself fails.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display(), count = articles.len()))]
pub async fn write_articles(
    path: impl AsRef<Path>,
    articles: &[Article],
) -> Result<(), Box<dyn Error>> {
    let path = path.as_ref();
    let json = articles_to_json(articles)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!("Wrote JSON output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Article {
        Article {
            title: "Čeští hokejisté vyhráli".to_string(),
            content: "Úvod. Text.".to_string(),
            category: "sport".to_string(),
            photo_count: 2,
            date: "1. ledna 2024".to_string(),
            comment_count: 7,
        }
    }

    #[test]
    fn test_json_keeps_diacritics_and_indent() {
        let json = String::from_utf8(articles_to_json(&[sample()]).unwrap()).unwrap();
        assert!(json.contains("Čeští hokejisté vyhráli"));
        assert!(json.contains("\n    {\n        \"title\""));
        assert!(json.starts_with('['));
    }

    #[test]
    fn test_empty_result_is_empty_array() {
        assert_eq!(articles_to_json(&[]).unwrap(), b"[]");
    }

    #[tokio::test]
    async fn test_write_overwrites_existing_file() {
        let dir = std::env::temp_dir().join(format!("archive-crawler-json-{}", std::process::id()));
        let path = dir.join("out.json");

        write_articles(&path, &[sample(), sample()]).await.unwrap();
        write_articles(&path, &[sample()]).await.unwrap();

        let written: Vec<Article> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, vec![sample()]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! Data models for rendered pages and extracted articles.
//!
//! - [`RenderedPage`]: post-script markup plus the URL the browser ended up on
//! - [`Article`]: one structured record extracted from an article page
//! - [`CrawlResult`]: everything one pipeline run produced

use serde::{Deserialize, Serialize};

/// Markup captured from a headless browser after the page became ready.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// The rendered document, including script-inserted nodes.
    pub markup: String,
    /// The URL after redirects. Category extraction reads this, not the
    /// requested URL.
    pub resolved_url: String,
}

/// A news article extracted from one rendered page.
///
/// All string fields are whitespace-trimmed. The record is created once by
/// the field extractor and never mutated afterwards.
///
/// # JSON Schema
///
/// Serialized as `{title, content, category, photos, date, comments}` to
/// keep the output file compatible with existing consumers of the dump.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// The article headline.
    pub title: String,
    /// Lead paragraph followed by the body text.
    pub content: String,
    /// Site section taken from the URL path (e.g. `sport`).
    pub category: String,
    /// Number of images inside the article body container.
    #[serde(rename = "photos")]
    pub photo_count: usize,
    /// Publication date exactly as the site prints it.
    pub date: String,
    /// Number of reader comments.
    #[serde(rename = "comments")]
    pub comment_count: u64,
}

/// Ordered articles collected by one pipeline run.
pub type CrawlResult = Vec<Article>;

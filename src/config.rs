//! Crawl configuration: site layout, browser timings, and archive URLs.
//!
//! Everything has a built-in default matching the idnes.cz sport archive, so
//! a run without a config file crawls the same fixed set of pages every time.
//! An optional YAML file can override any subset of fields:
//!
//! ```yaml
//! layout:
//!   link_selector: "a.art-link"
//!   archive_ready_selector: "a.art-link"
//! browser:
//!   readiness_timeout_secs: 20
//! ```
//!
//! Selectors are compiled once by [`SiteLayout::compile`]; an invalid one
//! stops the run at startup.

use crate::error::ConfigError;
use scraper::Selector;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

/// Default archive page template; `{page}` is replaced by the page index.
pub const DEFAULT_ARCHIVE_URL: &str = "https://www.idnes.cz/sport/archiv/{page}";

const PAGE_PLACEHOLDER: &str = "{page}";

/// Top-level configuration loaded from YAML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub layout: SiteLayout,
    pub browser: BrowserSettings,
}

/// Structural locators for one version of the site's markup.
///
/// The site has shipped more than one layout over time, so nothing here is
/// hard-wired in the extractors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteLayout {
    /// Anchors on an archive page that point at articles.
    pub link_selector: String,
    /// Element whose presence means an archive page finished loading.
    pub archive_ready_selector: String,
    /// Element whose presence means an article page finished loading.
    pub article_ready_selector: String,
    /// XPath of the consent button. Text-matched, hence locale-specific.
    pub consent_xpath: String,
    pub title_selector: String,
    pub opener_selector: String,
    pub body_selector: String,
    pub date_selector: String,
    pub comments_selector: String,
    /// Container whose `img` descendants are counted as photos.
    pub photos_selector: String,
    /// Index into the URL path segments that names the section.
    pub category_segment: usize,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            link_selector: "a.art-link".to_string(),
            archive_ready_selector: "a.art-link".to_string(),
            article_ready_selector: "a.art-link".to_string(),
            consent_xpath: r#"//a[contains(text(), "Souhlasím")]"#.to_string(),
            title_selector: "#space-a > div > h1".to_string(),
            opener_selector: "#space-a > div > div:nth-of-type(2)".to_string(),
            body_selector: "#space-b > div > div:nth-of-type(1)".to_string(),
            date_selector: "#space-a > div > div:nth-of-type(1) > div:nth-of-type(1) > div > span > span:nth-of-type(1)".to_string(),
            comments_selector: "#moot-linkin > span".to_string(),
            photos_selector: "#space-b".to_string(),
            category_segment: 0,
        }
    }
}

/// Headless browser behavior and timeouts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Path to a Chrome/Chromium binary; autodetected when unset.
    pub chrome_executable: Option<String>,
    /// Pause after navigation so initial scripts can run.
    pub settle_delay_ms: u64,
    pub consent_timeout_secs: u64,
    pub readiness_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            settle_delay_ms: 3_000,
            consent_timeout_secs: 10,
            readiness_timeout_secs: 10,
            poll_interval_ms: 250,
        }
    }
}

impl BrowserSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn consent_timeout(&self) -> Duration {
        Duration::from_secs(self.consent_timeout_secs)
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl CrawlConfig {
    /// Load configuration from an optional YAML file.
    ///
    /// # Arguments
    ///
    /// * `path` - YAML file to read; `None` yields the built-in defaults
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] when the file
    /// is given but cannot be used.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using built-in site layout");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        info!(%path, "Loaded crawl configuration");
        Ok(config)
    }

    fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not to an empty mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

/// A [`SiteLayout`] with every CSS selector parsed.
#[derive(Debug, Clone)]
pub struct CompiledLayout {
    pub links: Selector,
    pub title: Selector,
    pub opener: Selector,
    pub body: Selector,
    pub date: Selector,
    pub comments: Selector,
    pub photos: Selector,
    pub images: Selector,
    pub category_segment: usize,
    pub archive_ready: String,
    pub article_ready: String,
    pub consent_xpath: String,
}

impl SiteLayout {
    /// Parse all selectors, failing on the first invalid one.
    pub fn compile(&self) -> Result<CompiledLayout, ConfigError> {
        // Readiness markers are resolved by the browser, but a bad one would
        // time out on every page, so check them here too.
        parse_selector("archive_ready_selector", &self.archive_ready_selector)?;
        parse_selector("article_ready_selector", &self.article_ready_selector)?;

        Ok(CompiledLayout {
            links: parse_selector("link_selector", &self.link_selector)?,
            title: parse_selector("title_selector", &self.title_selector)?,
            opener: parse_selector("opener_selector", &self.opener_selector)?,
            body: parse_selector("body_selector", &self.body_selector)?,
            date: parse_selector("date_selector", &self.date_selector)?,
            comments: parse_selector("comments_selector", &self.comments_selector)?,
            photos: parse_selector("photos_selector", &self.photos_selector)?,
            images: parse_selector("img", "img")?,
            category_segment: self.category_segment,
            archive_ready: self.archive_ready_selector.clone(),
            article_ready: self.article_ready_selector.clone(),
            consent_xpath: self.consent_xpath.clone(),
        })
    }
}

fn parse_selector(field: &'static str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::Selector {
        field,
        selector: selector.to_string(),
    })
}

/// Expand an archive URL template over an inclusive page range.
///
/// # Examples
///
/// ```ignore
/// let urls = archive_urls("https://example.com/archiv/{page}", 1, 3)?;
/// assert_eq!(urls[2], "https://example.com/archiv/3");
/// ```
pub fn archive_urls(template: &str, first: u32, last: u32) -> Result<Vec<String>, ConfigError> {
    if !template.contains(PAGE_PLACEHOLDER) {
        return Err(ConfigError::Template(format!(
            "{template:?} has no {PAGE_PLACEHOLDER} placeholder"
        )));
    }
    if first > last {
        return Err(ConfigError::Template(format!(
            "first page {first} is after last page {last}"
        )));
    }
    Ok((first..=last)
        .map(|page| template.replace(PAGE_PLACEHOLDER, &page.to_string()))
        .collect())
}

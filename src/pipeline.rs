//! Two-stage crawl: archive pages to article URLs, article URLs to records.
//!
//! ```text
//! archive URLs ──run_all──▶ [fetch + extract_links] ──flatten──▶ article URLs
//! article URLs ──run_all──▶ [fetch + extract_article] ─────────▶ CrawlResult
//! ```
//!
//! Each stage gets its own bounded pool that is gone by the time the stage
//! returns. Duplicate article URLs are crawled as many times as they appear.

use crate::browser::PageSource;
use crate::config::CompiledLayout;
use crate::error::CrawlError;
use crate::models::{Article, CrawlResult};
use crate::runner::run_all;
use crate::scrapers::{archive, article};
use tracing::{debug, info, instrument};

/// Crawl pipeline over any [`PageSource`].
pub struct Pipeline<S> {
    source: S,
    layout: CompiledLayout,
    concurrency: usize,
}

impl<S: PageSource> Pipeline<S> {
    pub fn new(source: S, layout: CompiledLayout, concurrency: usize) -> Self {
        Self {
            source,
            layout,
            concurrency,
        }
    }

    /// Run both stages and return every article that extracted cleanly.
    #[instrument(level = "info", skip_all, fields(archive_pages = archive_urls.len(), concurrency = self.concurrency))]
    pub async fn run(&self, archive_urls: Vec<String>) -> CrawlResult {
        let article_urls = self.harvest_links(archive_urls).await;
        info!(count = article_urls.len(), "Collected article URLs");
        self.harvest_articles(article_urls).await
    }

    /// Stage 1: fetch each archive page and flatten the links it lists.
    pub async fn harvest_links(&self, archive_urls: Vec<String>) -> Vec<String> {
        let per_page = run_all(
            "archive",
            archive_urls,
            |url| async move { self.scrape_archive(&url).await },
            self.concurrency,
        )
        .await;
        per_page.into_iter().flatten().collect()
    }

    /// Stage 2: fetch each article page and extract its fields.
    pub async fn harvest_articles(&self, article_urls: Vec<String>) -> CrawlResult {
        run_all(
            "article",
            article_urls,
            |url| async move { self.scrape_article(&url).await },
            self.concurrency,
        )
        .await
    }

    async fn scrape_archive(&self, url: &str) -> Result<Vec<String>, CrawlError> {
        let page = self.source.fetch(url, &self.layout.archive_ready).await?;
        let hrefs = archive::extract_links(&page.markup, &self.layout.links);
        let links = archive::resolve_links(&page.resolved_url, hrefs);
        debug!(%url, count = links.len(), "Indexed archive page");
        Ok(links)
    }

    async fn scrape_article(&self, url: &str) -> Result<Article, CrawlError> {
        let page = self.source.fetch(url, &self.layout.article_ready).await?;
        let article = article::extract_article(&page.markup, &page.resolved_url, &self.layout)
            .inspect_err(|e| debug!(%url, reason = e.reason(), "Article layout did not match"))?;
        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteLayout;
    use crate::error::FetchError;
    use crate::models::RenderedPage;
    use crate::outputs::json::write_articles;
    use std::collections::HashMap;

    /// Serves canned markup keyed by URL; unknown URLs time out.
    struct StubSource {
        pages: HashMap<String, String>,
    }

    impl PageSource for StubSource {
        async fn fetch(&self, url: &str, ready_selector: &str) -> Result<RenderedPage, FetchError> {
            match self.pages.get(url) {
                Some(markup) => Ok(RenderedPage {
                    markup: markup.clone(),
                    resolved_url: url.to_string(),
                }),
                None => Err(FetchError::ReadinessTimeout {
                    url: url.to_string(),
                    selector: ready_selector.to_string(),
                }),
            }
        }
    }

    fn archive_markup(hrefs: &[String]) -> String {
        let anchors: String = hrefs
            .iter()
            .map(|href| format!(r#"<div class="art"><a class="art-link" href="{href}">x</a></div>"#))
            .collect();
        format!("<html><body>{anchors}</body></html>")
    }

    fn article_markup(title: &str, comments: u32) -> String {
        format!(
            r#"<html><body>
<div id="space-a"><div><div><div><div><span><span> 1. 1. 2024 </span></span></div></div></div><div> Úvod. </div><h1> {title} </h1></div></div>
<div id="space-b"><div><div>Text.</div><img src="p.jpg"></div></div>
<a id="moot-linkin"><span>{comments} komentářů</span></a>
</body></html>"#
        )
    }

    fn stub_site() -> (StubSource, Vec<String>) {
        let mut pages = HashMap::new();
        let mut archive_urls = Vec::new();
        for page in 1..=2 {
            let archive_url = format!("https://www.example.com/sport/archiv/{page}");
            let hrefs: Vec<String> = (1..=3)
                .map(|n| format!("https://www.example.com/sport/fotbal/clanek-{page}-{n}"))
                .collect();
            for (n, href) in hrefs.iter().enumerate() {
                pages.insert(href.clone(), article_markup(&format!("Článek {page}-{n}"), 10 + n as u32));
            }
            pages.insert(archive_url.clone(), archive_markup(&hrefs));
            archive_urls.push(archive_url);
        }
        (StubSource { pages }, archive_urls)
    }

    fn layout() -> CompiledLayout {
        SiteLayout::default().compile().unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_writes_six_articles() {
        let (source, archive_urls) = stub_site();
        let pipeline = Pipeline::new(source, layout(), 4);

        let articles = pipeline.run(archive_urls).await;
        assert_eq!(articles.len(), 6);
        assert!(articles.iter().all(|a| a.category == "sport"));
        assert!(articles.iter().all(|a| a.content == "Úvod. Text."));
        assert!(articles.iter().all(|a| a.photo_count == 1));

        let path = std::env::temp_dir().join(format!(
            "archive-crawler-e2e-{}/datas.json",
            std::process::id()
        ));
        write_articles(&path, &articles).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let array = written.as_array().unwrap();
        assert_eq!(array.len(), 6);
        for item in array {
            let keys: Vec<&str> = item.as_object().unwrap().keys().map(String::as_str).collect();
            for key in ["title", "content", "category", "photos", "date", "comments"] {
                assert!(keys.contains(&key), "missing key {key}");
            }
        }

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_failed_archive_page_is_skipped() {
        let (source, mut archive_urls) = stub_site();
        archive_urls.push("https://www.example.com/sport/archiv/99".to_string());
        let pipeline = Pipeline::new(source, layout(), 2);

        let links = pipeline.harvest_links(archive_urls).await;
        assert_eq!(links.len(), 6);
    }

    #[tokio::test]
    async fn test_duplicate_links_are_kept() {
        let (mut source, _) = stub_site();
        let href = "https://www.example.com/sport/fotbal/clanek-1-1".to_string();
        source.pages.insert(
            "https://www.example.com/sport/archiv/dup".to_string(),
            archive_markup(&[href.clone(), href]),
        );
        let pipeline = Pipeline::new(source, layout(), 2);

        let links = pipeline
            .harvest_links(vec!["https://www.example.com/sport/archiv/dup".to_string()])
            .await;
        assert_eq!(links.len(), 2);
        let articles = pipeline.harvest_articles(links).await;
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0], articles[1]);
    }

    #[tokio::test]
    async fn test_article_extraction_failure_is_dropped() {
        let (mut source, archive_urls) = stub_site();
        source.pages.insert(
            "https://www.example.com/sport/fotbal/clanek-2-3".to_string(),
            "<html><body><p>layout changed</p></body></html>".to_string(),
        );
        let pipeline = Pipeline::new(source, layout(), 3);

        let articles = pipeline.run(archive_urls).await;
        assert_eq!(articles.len(), 5);
    }
}

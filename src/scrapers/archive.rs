//! Archive page link extraction.
//!
//! An archive page is a paginated listing such as
//! `https://www.idnes.cz/sport/archiv/3`. Each listed article is an anchor
//! matching the layout's link selector (`a.art-link` by default).

use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// Extract article hrefs from archive markup.
///
/// Never fails: markup without matching anchors yields an empty list, and
/// anchors without an `href` are skipped.
///
/// # Arguments
///
/// * `markup` - Rendered HTML of one archive page
/// * `selector` - Anchor selector from the site layout
///
/// # Returns
///
/// The raw `href` values in document order.
pub fn extract_links(markup: &str, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(markup);
    let links: Vec<String> = document
        .select(selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::to_string)
        .collect();
    debug!(count = links.len(), "Extracted archive links");
    links
}

/// Resolve hrefs against the archive page they came from.
///
/// Absolute hrefs pass through unchanged; relative ones are joined onto
/// `base_url`. Hrefs that cannot be resolved are logged and dropped.
pub fn resolve_links(base_url: &str, hrefs: Vec<String>) -> Vec<String> {
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(e) => {
            warn!(%base_url, error = %e, "Archive URL does not parse; keeping only absolute links");
            return hrefs
                .into_iter()
                .filter(|href| Url::parse(href).is_ok())
                .collect();
        }
    };

    hrefs
        .into_iter()
        .filter_map(|href| match base.join(&href) {
            Ok(resolved) => Some(resolved.to_string()),
            Err(e) => {
                warn!(%href, error = %e, "Dropping unresolvable link");
                None
            }
        })
        .collect()
}

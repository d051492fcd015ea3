//! Markup extractors for the two crawl stages.
//!
//! Both extractors are pure functions over already-rendered markup; they
//! never touch the browser. This keeps them testable against fixture HTML.
//!
//! | Stage | Module | Input | Output |
//! |-------|--------|-------|--------|
//! | 1 | [`archive`] | archive page markup | article URLs |
//! | 2 | [`article`] | article page markup + resolved URL | [`Article`](crate::models::Article) |
//!
//! Extraction is purely structural. A change to the site's markup shows up
//! either as empty link lists or as `ExtractionError`s in the logs; the
//! selectors live in [`SiteLayout`](crate::config::SiteLayout) so a new layout
//! needs only a config file.

pub mod archive;
pub mod article;

use scraper::ElementRef;

/// Concatenate the direct text-node children of an element.
///
/// Text inside nested elements is ignored, matching how the site separates
/// a heading's own text from decorations like badges or icons.
pub(crate) fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_own_text_skips_nested_elements() {
        let doc = Html::parse_fragment("<h1> Hlavní <span>EXTRA</span>zpráva </h1>");
        let selector = Selector::parse("h1").unwrap();
        let h1 = doc.select(&selector).next().unwrap();
        assert_eq!(own_text(h1), " Hlavní zpráva ");
    }
}

//! Article page field extraction.
//!
//! Turns one rendered article page into an [`Article`]. Every field comes
//! from a fixed structural locator in the [`CompiledLayout`], except the
//! category, which is read from the resolved URL's path:
//!
//! ```text
//! https://www.idnes.cz/sport/fotbal/some-article.A240101_123456_fotbal_abc
//!                      ^^^^^
//!                      path segment 0 -> category "sport"
//! ```

use super::own_text;
use crate::config::CompiledLayout;
use crate::error::ExtractionError;
use crate::models::Article;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));

/// Extract an [`Article`] from rendered markup.
///
/// # Arguments
///
/// * `markup` - Rendered HTML of the article page
/// * `resolved_url` - URL the browser ended up on, used for the category
/// * `layout` - Compiled locators for the current site layout
///
/// # Errors
///
/// - [`ExtractionError::MissingField`] if the title, opener, body, date, or
///   comment locator matches nothing, or if a matched text field has no
///   direct text of its own
/// - [`ExtractionError::MalformedUrl`] if the URL has no category segment
/// - [`ExtractionError::NoCommentCount`] if the comment label has no digits
#[instrument(level = "debug", skip(markup, layout), fields(bytes = markup.len()))]
pub fn extract_article(
    markup: &str,
    resolved_url: &str,
    layout: &CompiledLayout,
) -> Result<Article, ExtractionError> {
    let document = Html::parse_document(markup);

    let title = required_text(&document, &layout.title, "title")?;
    let opener = required_text(&document, &layout.opener, "opener")?;
    let body = required_text(&document, &layout.body, "body")?;
    let date = required_text(&document, &layout.date, "date")?;
    let comment_label = first_match(&document, &layout.comments, "comments")?
        .text()
        .collect::<String>();

    let category = category_from_url(resolved_url, layout.category_segment)?;
    let comment_count = parse_comment_count(&comment_label)?;
    let photo_count = count_photos(&document, &layout.photos, &layout.images);

    let article = Article {
        title: title.trim().to_string(),
        content: format!("{opener}{body}").trim().to_string(),
        category: category.trim().to_string(),
        photo_count,
        date: date.trim().to_string(),
        comment_count,
    };
    debug!(
        title = %truncate_for_log(&article.title, 80),
        category = %article.category,
        "Extracted article"
    );
    Ok(article)
}

fn first_match<'a>(
    document: &'a Html,
    selector: &Selector,
    field: &'static str,
) -> Result<ElementRef<'a>, ExtractionError> {
    document
        .select(selector)
        .next()
        .ok_or(ExtractionError::MissingField { field })
}

/// Direct text of the first element matching `selector`.
///
/// Text that only exists inside child elements does not count; an element
/// with nothing but whitespace of its own is treated as missing.
fn required_text(
    document: &Html,
    selector: &Selector,
    field: &'static str,
) -> Result<String, ExtractionError> {
    let text = own_text(first_match(document, selector, field)?);
    if text.trim().is_empty() {
        return Err(ExtractionError::MissingField { field });
    }
    Ok(text)
}

/// Take the path segment at `index` of `url` as the article's category.
///
/// Percent-encoded segments are returned as-is.
pub fn category_from_url(url: &str, index: usize) -> Result<String, ExtractionError> {
    let malformed = || ExtractionError::MalformedUrl {
        url: url.to_string(),
        index,
    };

    let parsed = Url::parse(url).map_err(|_| malformed())?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.nth(index))
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(malformed)
}

/// Parse the first maximal run of digits in a comment-count label.
///
/// `"Zobrazit 42 komentářů"` yields `42`. Separators are not understood,
/// so `"1 024 komentářů"` yields `1`.
pub fn parse_comment_count(label: &str) -> Result<u64, ExtractionError> {
    let no_count = || ExtractionError::NoCommentCount {
        label: label.to_string(),
    };
    DIGIT_RUN
        .find(label)
        .and_then(|run| run.as_str().parse().ok())
        .ok_or_else(no_count)
}

fn count_photos(document: &Html, container: &Selector, images: &Selector) -> usize {
    document
        .select(container)
        .next()
        .map(|container| container.select(images).count())
        .unwrap_or(0)
}

//! Error types for fetching, extraction, and configuration.
//!
//! Fetch and extraction failures are per-item: the parallel runner logs them
//! against the offending URL and drops the item. Configuration failures are
//! fatal and surface from `main` before any browser is launched.

use chromiumoxide::error::CdpError;
use thiserror::Error;

/// Failure to obtain rendered markup for one URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The browser process could not be configured or started.
    #[error("failed to launch browser for {url}: {reason}")]
    Launch { url: String, reason: String },

    /// A CDP command failed while driving the page.
    #[error("browser error on {url}: {source}")]
    Browser {
        url: String,
        #[source]
        source: CdpError,
    },

    /// The readiness marker never appeared within the timeout.
    #[error("readiness-timeout: `{selector}` never appeared on {url}")]
    ReadinessTimeout { url: String, selector: String },
}

impl FetchError {
    /// Short machine-friendly reason tag, used as a structured log field.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Launch { .. } => "launch-failed",
            FetchError::Browser { .. } => "browser-error",
            FetchError::ReadinessTimeout { .. } => "readiness-timeout",
        }
    }
}

/// Failure to turn an article page into an [`Article`](crate::models::Article).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// A required locator matched zero elements.
    #[error("missing-field: locator for `{field}` matched nothing")]
    MissingField { field: &'static str },

    /// The resolved URL has no usable path segment at the category index.
    #[error("malformed-url: {url} has no path segment at index {index}")]
    MalformedUrl { url: String, index: usize },

    /// The comment label contains no digits.
    #[error("no-comment-count: no digits in label {label:?}")]
    NoCommentCount { label: String },
}

impl ExtractionError {
    pub fn reason(&self) -> &'static str {
        match self {
            ExtractionError::MissingField { .. } => "missing-field",
            ExtractionError::MalformedUrl { .. } => "malformed-url",
            ExtractionError::NoCommentCount { .. } => "no-comment-count",
        }
    }
}

/// Anything that can sink a single crawl item in either pipeline stage.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid selector for `{field}`: {selector:?}")]
    Selector { field: &'static str, selector: String },

    #[error("invalid archive URL template: {0}")]
    Template(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_reasons() {
        assert_eq!(
            ExtractionError::MissingField { field: "title" }.reason(),
            "missing-field"
        );
        assert_eq!(
            ExtractionError::MalformedUrl {
                url: "https://example.com/".into(),
                index: 0
            }
            .reason(),
            "malformed-url"
        );
        assert_eq!(
            ExtractionError::NoCommentCount {
                label: "žádné komentáře".into()
            }
            .reason(),
            "no-comment-count"
        );
    }

    #[test]
    fn test_crawl_error_is_transparent() {
        let err: CrawlError = FetchError::ReadinessTimeout {
            url: "https://example.com/a".into(),
            selector: "a.art-link".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "readiness-timeout: `a.art-link` never appeared on https://example.com/a"
        );
    }
}

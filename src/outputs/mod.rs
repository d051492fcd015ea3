//! Output generation for crawl results.
//!
//! # Submodules
//!
//! - [`json`]: Writes the collected articles to a single JSON array file
//!
//! # Output Structure
//!
//! ```text
//! datas.json   # overwritten on every run
//! ```

pub mod json;

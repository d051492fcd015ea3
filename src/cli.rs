//! Command-line interface definitions for the archive crawler.
//!
//! Every argument is optional. Running the binary bare crawls the idnes.cz
//! sport archive, pages 1 through 17, eight pages at a time, into
//! `datas.json`.

use crate::config::DEFAULT_ARCHIVE_URL;
use clap::Parser;

/// Command-line arguments for the archive crawler.
///
/// # Examples
///
/// ```sh
/// # The default crawl
/// archive_crawler
///
/// # Fewer pages, different output, custom layout file
/// archive_crawler --last-page 3 -o out/sport.json -c layout.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output file for the JSON article dump (overwritten)
    #[arg(short, long, default_value = "datas.json")]
    pub output: String,

    /// Optional path to a YAML file overriding site layout and browser settings
    #[arg(short, long)]
    pub config: Option<String>,

    /// Maximum number of pages rendered at the same time
    #[arg(long, env = "CRAWL_CONCURRENCY", default_value_t = 8)]
    pub concurrency: usize,

    /// Archive page URL template; `{page}` is replaced by the page number
    #[arg(long, default_value = DEFAULT_ARCHIVE_URL)]
    pub archive_url: String,

    /// First archive page to crawl
    #[arg(long, default_value_t = 1)]
    pub first_page: u32,

    /// Last archive page to crawl (inclusive)
    #[arg(long, default_value_t = 17)]
    pub last_page: u32,

    /// Chrome/Chromium binary; overrides the config file
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_executable: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["archive_crawler"]);

        assert_eq!(cli.output, "datas.json");
        assert_eq!(cli.config, None);
        assert_eq!(cli.archive_url, DEFAULT_ARCHIVE_URL);
        assert_eq!(cli.first_page, 1);
        assert_eq!(cli.last_page, 17);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "archive_crawler",
            "-o",
            "/tmp/out.json",
            "-c",
            "/tmp/layout.yaml",
            "--concurrency",
            "3",
            "--last-page",
            "2",
        ]);

        assert_eq!(cli.output, "/tmp/out.json");
        assert_eq!(cli.config.as_deref(), Some("/tmp/layout.yaml"));
        assert_eq!(cli.concurrency, 3);
        assert_eq!(cli.last_page, 2);
    }
}

//! Headless Chromium page fetching.
//!
//! Each [`ChromeFetcher::fetch`] call launches its own browser process and
//! shuts it down before returning. Nothing is shared between workers.
//!
//! # Lifecycle of one fetch
//!
//! 1. [`BrowserSession::launch`] starts Chromium with a private profile dir
//! 2. Navigate, bounded by the settle delay (eager: subresources may still be
//!    loading when we move on)
//! 3. [`try_dismiss_consent`] clicks the consent button if one shows up
//! 4. [`wait_for_selector`] blocks until the readiness marker exists
//! 5. Markup and resolved URL are captured
//! 6. [`BrowserSession::close`] shuts the process down on every exit path,
//!    killing it if it does not exit within a grace period
//!
//! If the fetch future is dropped halfway, `Drop` aborts the CDP handler task
//! and chromiumoxide kills the child process.

use crate::config::BrowserSettings;
use crate::error::FetchError;
use crate::models::RenderedPage;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(0);

/// Something that can turn a URL into rendered markup.
///
/// The pipeline is generic over this trait so it can be driven by a stub in
/// tests instead of a real browser.
pub trait PageSource {
    /// Render `url` and return its markup once `ready_selector` matches.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ReadinessTimeout`] if the marker never appears,
    /// or another [`FetchError`] if the browser itself fails.
    async fn fetch(&self, url: &str, ready_selector: &str) -> Result<RenderedPage, FetchError>;
}

/// A running Chromium process owned by exactly one fetch.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl BrowserSession {
    /// Launch a fresh headless browser.
    ///
    /// Every session gets its own user-data directory; concurrent Chromium
    /// instances sharing a profile refuse to start.
    #[instrument(level = "debug", skip(settings))]
    pub async fn launch(settings: &BrowserSettings, url: &str) -> Result<Self, FetchError> {
        Self::launch_in(settings, url, next_profile_dir()).await
    }

    async fn launch_in(
        settings: &BrowserSettings,
        url: &str,
        profile_dir: PathBuf,
    ) -> Result<Self, FetchError> {
        let (browser, mut handler) = match start_browser(settings, &profile_dir).await {
            Ok(started) => started,
            Err(reason) => {
                remove_profile_dir(&profile_dir).await;
                return Err(FetchError::Launch {
                    url: url.to_string(),
                    reason,
                });
            }
        };

        // The CDP connection only makes progress while the handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!(profile_dir = %profile_dir.display(), "Browser launched");
        Ok(Self {
            browser,
            handler,
            profile_dir,
        })
    }

    pub async fn new_page(&self) -> Result<Page, CdpError> {
        self.browser.new_page("about:blank").await
    }

    /// Shut the browser down and remove its profile directory.
    ///
    /// Asks Chromium to exit and waits up to [`SHUTDOWN_GRACE`]; a process
    /// that is still around after that is killed. Failures are logged, never
    /// returned: by the time we close, the fetch outcome is already decided.
    pub async fn close(mut self) {
        let browser = &mut self.browser;
        let exited = completed_within(SHUTDOWN_GRACE, async {
            if let Err(e) = browser.close().await {
                debug!(error = %e, "Browser close command failed");
                return false;
            }
            match browser.wait().await {
                Ok(_) => true,
                Err(e) => {
                    debug!(error = %e, "Waiting for browser exit failed");
                    false
                }
            }
        })
        .await;

        if !exited {
            warn!("Browser did not exit cleanly; killing it");
            match timeout(SHUTDOWN_GRACE, self.browser.kill()).await {
                Ok(Some(Err(e))) => debug!(error = %e, "Killing browser failed"),
                Ok(_) => {}
                Err(_) => debug!("Browser still not reaped after kill"),
            }
        }

        self.handler.abort();
        remove_profile_dir(&self.profile_dir).await;
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// How long a closing browser gets before it is killed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

async fn start_browser(
    settings: &BrowserSettings,
    profile_dir: &Path,
) -> Result<(Browser, Handler), String> {
    let mut builder = BrowserConfig::builder()
        .user_data_dir(profile_dir)
        .no_sandbox()
        .args([
            "--ignore-certificate-errors",
            "--ignore-ssl-errors",
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--log-level=3",
        ]);
    builder = if settings.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = &settings.chrome_executable {
        builder = builder.chrome_executable(path);
    }
    let config = builder.build()?;

    Browser::launch(config).await.map_err(|e| e.to_string())
}

async fn remove_profile_dir(profile_dir: &Path) {
    match tokio::fs::remove_dir_all(profile_dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            debug!(profile_dir = %profile_dir.display(), error = %e, "Profile dir cleanup failed")
        }
    }
}

fn next_profile_dir() -> PathBuf {
    let id = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("archive-crawler-{}-{}", std::process::id(), id))
}

/// Await `work`, treating a timeout the same as a `false` result.
async fn completed_within(grace: Duration, work: impl Future<Output = bool>) -> bool {
    timeout(grace, work).await.unwrap_or(false)
}

/// Run `check` every `poll` until it returns `true` or `within` elapses.
async fn poll_until<F, Fut>(within: Duration, poll: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let attempt = async {
        while !check().await {
            sleep(poll).await;
        }
    };
    timeout(within, attempt).await.is_ok()
}

/// Click the consent button if it becomes clickable before `within` elapses.
///
/// A button that is found but rejects the click (still animating in, covered
/// by an overlay) is retried on the next poll. Returns `false` when no click
/// lands in time. A missing dialog is the normal case on repeat visits, so
/// this never errors.
pub async fn try_dismiss_consent(page: &Page, xpath: &str, within: Duration, poll: Duration) -> bool {
    poll_until(within, poll, move || async move {
        let Ok(button) = page.find_xpath(xpath).await else {
            return false;
        };
        match button.click().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Consent button not clickable yet");
                false
            }
        }
    })
    .await
}

/// Poll until an element matching `selector` exists.
///
/// Returns `false` if `within` elapses first.
pub async fn wait_for_selector(page: &Page, selector: &str, within: Duration, poll: Duration) -> bool {
    poll_until(within, poll, move || async move { page.find_element(selector).await.is_ok() }).await
}

/// [`PageSource`] backed by one headless Chromium process per call.
#[derive(Debug, Clone)]
pub struct ChromeFetcher {
    settings: BrowserSettings,
    consent_xpath: String,
}

impl ChromeFetcher {
    pub fn new(settings: BrowserSettings, consent_xpath: impl Into<String>) -> Self {
        Self {
            settings,
            consent_xpath: consent_xpath.into(),
        }
    }

    async fn render(
        &self,
        session: &BrowserSession,
        url: &str,
        ready_selector: &str,
    ) -> Result<RenderedPage, FetchError> {
        let cdp = |source: CdpError| FetchError::Browser {
            url: url.to_string(),
            source,
        };
        let settle = self.settings.settle_delay();
        let poll = self.settings.poll_interval();

        let page = session.new_page().await.map_err(cdp)?;

        let started = Instant::now();
        match timeout(settle, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(cdp(e)),
            Err(_) => debug!("Page still loading after settle delay; continuing"),
        }
        sleep(settle.saturating_sub(started.elapsed())).await;

        let dismissed = try_dismiss_consent(
            &page,
            &self.consent_xpath,
            self.settings.consent_timeout(),
            poll,
        )
        .await;
        debug!(dismissed, "Consent step finished");

        if !wait_for_selector(&page, ready_selector, self.settings.readiness_timeout(), poll).await {
            return Err(FetchError::ReadinessTimeout {
                url: url.to_string(),
                selector: ready_selector.to_string(),
            });
        }

        let markup = page.content().await.map_err(cdp)?;
        let resolved_url = page
            .url()
            .await
            .map_err(cdp)?
            .unwrap_or_else(|| url.to_string());

        Ok(RenderedPage {
            markup,
            resolved_url,
        })
    }
}

impl PageSource for ChromeFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str, ready_selector: &str) -> Result<RenderedPage, FetchError> {
        let t0 = Instant::now();
        let session = BrowserSession::launch(&self.settings, url).await?;
        let outcome = self.render(&session, url, ready_selector).await;
        session.close().await;

        let elapsed_ms = t0.elapsed().as_millis() as u64;
        match &outcome {
            Ok(page) => info!(
                elapsed_ms,
                bytes = page.markup.len(),
                resolved_url = %page.resolved_url,
                "Rendered page"
            ),
            Err(e) => warn!(elapsed_ms, reason = e.reason(), error = %e, "Fetch failed"),
        }
        outcome
    }
}

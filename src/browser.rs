use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::Html;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ScraperConfig;
use crate::utils::error::{AppError, Result};

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

// Resolves to -1 until the document has loaded, then to the number of
// finished resource loads. A stable count means the network went quiet.
const RESOURCE_COUNT_JS: &str = "document.readyState === 'complete' \
    ? performance.getEntriesByType('resource').length : -1";

// 0 when the browser does not expose the navigation status.
const RESPONSE_STATUS_JS: &str = "(performance.getEntriesByType('navigation')[0] || {}).responseStatus || 0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// Return once the load event has fired.
    Load,
    /// Additionally wait until no new resources finish for the idle window.
    NetworkIdle,
}

/// How a provider page is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchProfile {
    pub wait_until: WaitUntil,
    pub timeout: Duration,
    pub idle_window: Duration,
    pub settle_delay: Duration,
}

impl FetchProfile {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            wait_until: WaitUntil::NetworkIdle,
            timeout: config.navigation_timeout(),
            idle_window: config.network_idle(),
            settle_delay: config.settle_delay(),
        }
    }
}

/// DOM snapshot of a page after client-side rendering finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

impl RenderedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

/// Loads provider pages. Implementations fail with `AppError::Navigation`
/// when a page cannot be loaded and rendered within the profile's timeout.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, profile: &FetchProfile) -> Result<RenderedPage>;
}

/// Starts and stops the browser for one run.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Fetcher: PageFetcher + 'static;

    /// Errors here are fatal for the run.
    async fn launch(&self, config: &ScraperConfig) -> Result<Self::Fetcher>;

    async fn release(&self, fetcher: Self::Fetcher);
}

pub struct ChromeLauncher;

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    type Fetcher = ChromeFetcher;

    async fn launch(&self, config: &ScraperConfig) -> Result<ChromeFetcher> {
        ChromeFetcher::launch(config).await
    }

    async fn release(&self, fetcher: ChromeFetcher) {
        fetcher.close().await
    }
}

/// Headless Chrome with a single tab that every provider fetch reuses.
pub struct ChromeFetcher {
    browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeFetcher {
    pub async fn launch(config: &ScraperConfig) -> Result<Self> {
        let config = config.clone();
        tokio::task::spawn_blocking(move || Self::launch_blocking(&config))
            .await
            .map_err(|e| AppError::Browser(format!("Browser launch task failed: {}", e)))?
    }

    fn launch_blocking(config: &ScraperConfig) -> Result<Self> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false)
            .idle_browser_timeout(idle_browser_timeout(config))
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
                OsStr::new("--disable-background-timer-throttling"),
                OsStr::new("--disable-renderer-backgrounding"),
            ])
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Browser(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Browser(format!("Failed to create tab: {}", e)))?;

        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| AppError::Browser(format!("Failed to set user agent: {}", e)))?;

        tracing::debug!(headless = config.headless, "Browser launched");
        Ok(Self { browser, tab })
    }

    /// Closes the tab and the browser process. Dropping the fetcher also
    /// kills the process; this variant reports what went wrong.
    pub async fn close(self) {
        let ChromeFetcher { browser, tab } = self;
        let closed = tokio::task::spawn_blocking(move || {
            let result = tab.close(true);
            drop(browser);
            result
        })
        .await;

        match closed {
            Ok(Ok(_)) => tracing::debug!("Browser closed"),
            Ok(Err(e)) => tracing::warn!("Failed to close browser tab cleanly: {}", e),
            Err(e) => tracing::warn!("Browser close task failed: {}", e),
        }
    }
}

#[async_trait]
impl PageFetcher for ChromeFetcher {
    async fn fetch(&self, url: &str, profile: &FetchProfile) -> Result<RenderedPage> {
        let start_time = Instant::now();

        let tab = Arc::clone(&self.tab);
        let target = url.to_string();
        let nav_profile = profile.clone();
        tokio::task::spawn_blocking(move || navigate(&tab, &target, &nav_profile))
            .await
            .map_err(|e| AppError::navigation(url, format!("navigation task failed: {}", e)))??;

        // Give client-side frameworks time to paint the price tables.
        tokio::time::sleep(profile.settle_delay).await;

        let tab = Arc::clone(&self.tab);
        let html = tokio::task::spawn_blocking(move || tab.get_content())
            .await
            .map_err(|e| AppError::navigation(url, format!("content task failed: {}", e)))?
            .map_err(|e| AppError::navigation(url, format!("failed to get page content: {}", e)))?;

        tracing::debug!(
            url,
            bytes = html.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Page rendered"
        );

        Ok(RenderedPage::new(url, html))
    }
}

/// The DevTools connection must stay open across the slowest navigation, its
/// settle delay and the pause before a retry.
fn idle_browser_timeout(config: &ScraperConfig) -> Duration {
    config.navigation_timeout() + config.settle_delay() + config.retry_delay() + Duration::from_secs(30)
}

/// `None` for 2xx, and for 0 which means the status was not exposed.
fn status_error(status: i64) -> Option<String> {
    if status == 0 || (200..300).contains(&status) {
        None
    } else {
        Some(format!("HTTP status {}", status))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdleState {
    Idle,
    Waiting,
    TimedOut,
}

/// Tracks the finished-resource count between polls. The network is idle
/// once a loaded document keeps the same count for the idle window.
struct IdleTracker {
    idle_window: Duration,
    deadline: Instant,
    last_count: i64,
    quiet_since: Instant,
}

impl IdleTracker {
    fn new(start: Instant, idle_window: Duration, deadline: Instant) -> Self {
        Self {
            idle_window,
            deadline,
            last_count: -1,
            quiet_since: start,
        }
    }

    fn observe(&mut self, count: i64, now: Instant) -> IdleState {
        if count != self.last_count {
            self.last_count = count;
            self.quiet_since = now;
        } else if count >= 0 && now.saturating_duration_since(self.quiet_since) >= self.idle_window {
            return IdleState::Idle;
        }

        if now >= self.deadline {
            IdleState::TimedOut
        } else {
            IdleState::Waiting
        }
    }
}

fn navigate(tab: &Tab, url: &str, profile: &FetchProfile) -> Result<()> {
    // One budget for the load and the idle wait together.
    let deadline = Instant::now() + profile.timeout;
    tab.set_default_timeout(profile.timeout);

    tab.navigate_to(url)
        .map_err(|e| AppError::navigation(url, e.to_string()))?;
    tab.wait_until_navigated()
        .map_err(|e| AppError::navigation(url, format!("page load failed: {}", e)))?;

    let status = evaluate_i64(tab, RESPONSE_STATUS_JS).unwrap_or(0);
    if let Some(message) = status_error(status) {
        return Err(AppError::navigation(url, message));
    }

    if profile.wait_until == WaitUntil::NetworkIdle {
        wait_for_network_idle(tab, url, profile, deadline)?;
    }

    Ok(())
}

fn wait_for_network_idle(tab: &Tab, url: &str, profile: &FetchProfile, deadline: Instant) -> Result<()> {
    let mut tracker = IdleTracker::new(Instant::now(), profile.idle_window, deadline);

    loop {
        let count = evaluate_i64(tab, RESOURCE_COUNT_JS)
            .map_err(|e| AppError::navigation(url, format!("network idle check failed: {}", e)))?;

        match tracker.observe(count, Instant::now()) {
            IdleState::Idle => return Ok(()),
            IdleState::TimedOut => {
                return Err(AppError::navigation(
                    url,
                    format!("timed out after {}ms waiting for network idle", profile.timeout.as_millis()),
                ));
            }
            IdleState::Waiting => std::thread::sleep(IDLE_POLL_INTERVAL),
        }
    }
}

fn evaluate_i64(tab: &Tab, expression: &str) -> anyhow::Result<i64> {
    let result = tab.evaluate(expression, false)?;
    Ok(result.value.and_then(|v| v.as_i64()).unwrap_or(0))
}

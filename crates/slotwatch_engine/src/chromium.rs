//! Page session driving a headless Chromium through chromiumoxide.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use engine_logging::engine_debug;
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use crate::session::{PageSession, SessionOpener, WaitCondition};
use crate::{FailureKind, PageError};

/// Environment variable that overrides browser discovery.
pub const CHROME_PATH_ENV: &str = "SLOTWATCH_CHROME_PATH";

/// Interval between checks while waiting for a condition.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Find a Chromium or Chrome binary.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var(CHROME_PATH_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    ["chromium", "chromium-browser", "google-chrome", "google-chrome-stable"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
}

#[derive(Debug, Clone, Default)]
pub struct ChromiumOpener {
    executable: Option<PathBuf>,
}

impl ChromiumOpener {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }
}

#[async_trait]
impl SessionOpener for ChromiumOpener {
    async fn open(&self) -> Result<Box<dyn PageSession>, PageError> {
        let executable = self.executable.clone().or_else(find_chromium);
        Ok(Box::new(ChromiumSession::launch(executable).await?))
    }
}

/// One headless browser with a single page, reused for every navigation.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl ChromiumSession {
    pub async fn launch(executable: Option<PathBuf>) -> Result<Self, PageError> {
        let mut builder = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-blink-features=AutomationControlled");
        if let Some(path) = executable {
            engine_debug!("using browser at {}", path.display());
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| PageError::new(FailureKind::Browser, format!("browser config: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| browser_error("failed to launch browser", e))?;

        // The CDP connection only makes progress while its handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(browser_error("failed to open page", e));
            }
        };

        Ok(Self {
            browser,
            handler,
            page,
        })
    }

    async fn condition_holds(&self, condition: &WaitCondition) -> Result<bool, PageError> {
        let script = match condition {
            WaitCondition::Selector(css) => format!(
                "document.querySelector({}) !== null",
                js_string(css)?
            ),
            WaitCondition::Text(text) => format!(
                "document.body !== null && document.body.innerText.includes({})",
                js_string(text)?
            ),
        };
        self.page
            .evaluate(script)
            .await
            .map_err(|e| browser_error("condition check failed", e))?
            .into_value::<bool>()
            .map_err(|e| PageError::new(FailureKind::Browser, e.to_string()))
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), PageError> {
        url::Url::parse(url)
            .map_err(|err| PageError::new(FailureKind::InvalidUrl, err.to_string()))?;
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(browser_error("navigation failed", e)),
            Err(_) => Err(PageError::new(
                FailureKind::Timeout,
                format!("navigation timed out after {}ms", timeout.as_millis()),
            )),
        }
    }

    async fn wait_for(
        &mut self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> Result<(), PageError> {
        let poll = async {
            loop {
                // Errors while the page is still settling are retried until the deadline.
                if let Ok(true) = self.condition_holds(condition).await {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.map_err(|_| {
            PageError::new(
                FailureKind::Timeout,
                format!("{condition} not seen within {}ms", timeout.as_millis()),
            )
        })
    }

    async fn inner_text(&mut self, selector: &str) -> Result<String, PageError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| PageError::new(FailureKind::ConditionNotMet, e.to_string()))?;
        let text = element
            .inner_text()
            .await
            .map_err(|e| browser_error("failed to read text", e))?;
        Ok(text.unwrap_or_default())
    }

    async fn content(&mut self) -> Result<String, PageError> {
        self.page
            .content()
            .await
            .map_err(|e| browser_error("failed to read content", e))
    }

    async fn close(self: Box<Self>) -> Result<(), PageError> {
        let ChromiumSession {
            mut browser,
            handler,
            page,
        } = *self;

        let page_result = page.close().await;
        let browser_result = browser.close().await;
        if browser_result.is_ok() {
            let _ = browser.wait().await;
        }
        handler.abort();

        page_result.map_err(|e| browser_error("failed to close page", e))?;
        browser_result
            .map(|_| ())
            .map_err(|e| browser_error("failed to close browser", e))
    }
}

fn js_string(value: &str) -> Result<String, PageError> {
    serde_json::to_string(value).map_err(|e| PageError::new(FailureKind::Browser, e.to_string()))
}

fn browser_error(context: &str, err: impl std::fmt::Display) -> PageError {
    PageError::new(FailureKind::Browser, format!("{context}: {err}"))
}

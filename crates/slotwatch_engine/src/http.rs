//! Page session backed by plain HTTP requests.
//!
//! Pages are fetched once and inspected as static HTML, so conditions are
//! evaluated against the document as served: nothing rendered by scripts will
//! ever appear. Use it for sites that do not need a browser.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use engine_logging::engine_debug;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use scraper::{ElementRef, Html, Selector};

use crate::decode::decode_page;
use crate::session::{PageSession, SessionOpener, WaitCondition};
use crate::{FailureKind, PageError};

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
                "text/plain".to_string(),
            ],
            user_agent: concat!("slotwatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpOpener {
    settings: HttpSettings,
}

impl HttpOpener {
    pub fn new(settings: HttpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SessionOpener for HttpOpener {
    async fn open(&self) -> Result<Box<dyn PageSession>, PageError> {
        Ok(Box::new(HttpSession::new(self.settings.clone())?))
    }
}

#[derive(Debug, Clone)]
struct LoadedPage {
    final_url: String,
    html: String,
}

pub struct HttpSession {
    settings: HttpSettings,
    client: reqwest::Client,
    redirect_counter: Arc<AtomicUsize>,
    page: Option<LoadedPage>,
}

impl HttpSession {
    pub fn new(settings: HttpSettings) -> Result<Self, PageError> {
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let client = build_client(&settings, redirect_counter.clone())?;
        Ok(Self {
            settings,
            client,
            redirect_counter,
            page: None,
        })
    }

    /// URL of the loaded page after redirects.
    pub fn current_url(&self) -> Option<&str> {
        self.page.as_ref().map(|p| p.final_url.as_str())
    }

    fn loaded(&self) -> Result<&LoadedPage, PageError> {
        self.page
            .as_ref()
            .ok_or_else(|| PageError::new(FailureKind::NoPage, "navigate before reading"))
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<LoadedPage, PageError> {
        let parsed = url::Url::parse(url)
            .map_err(|err| PageError::new(FailureKind::InvalidUrl, err.to_string()))?;
        self.redirect_counter.store(0, Ordering::Relaxed);

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(PageError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let decoded = decode_page(&bytes, content_type.as_deref());
        if decoded.had_errors {
            engine_debug!(
                "{} has malformed {} sequences; replaced",
                final_url,
                decoded.encoding_label
            );
        }

        engine_debug!(
            "fetched {} ({} bytes, {} redirects, {})",
            final_url,
            bytes.len(),
            self.redirect_counter.load(Ordering::Relaxed),
            decoded.encoding_label
        );

        Ok(LoadedPage {
            final_url,
            html: decoded.html,
        })
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), PageError> {
        self.page = None;
        self.page = Some(self.fetch(url, timeout).await?);
        Ok(())
    }

    /// Static documents never change, so the timeout is not waited out: the
    /// condition either holds on the served HTML or fails immediately.
    async fn wait_for(
        &mut self,
        condition: &WaitCondition,
        _timeout: Duration,
    ) -> Result<(), PageError> {
        let page = self.loaded()?;
        let document = Html::parse_document(&page.html);
        let met = match condition {
            WaitCondition::Selector(css) => document.select(&parse_selector(css)?).next().is_some(),
            WaitCondition::Text(text) => {
                let body = document.select(&parse_selector("body")?).next();
                body.is_some_and(|body| rendered_text(body).contains(text.as_str()))
            }
        };
        if met {
            Ok(())
        } else {
            Err(PageError::new(
                FailureKind::ConditionNotMet,
                format!("{condition} not present"),
            ))
        }
    }

    async fn inner_text(&mut self, selector: &str) -> Result<String, PageError> {
        let page = self.loaded()?;
        let document = Html::parse_document(&page.html);
        let selector_parsed = parse_selector(selector)?;
        let element = document.select(&selector_parsed).next().ok_or_else(|| {
            PageError::new(
                FailureKind::ConditionNotMet,
                format!("no element matches `{selector}`"),
            )
        })?;
        Ok(rendered_text(element))
    }

    async fn content(&mut self) -> Result<String, PageError> {
        Ok(self.loaded()?.html.clone())
    }

    async fn close(self: Box<Self>) -> Result<(), PageError> {
        Ok(())
    }
}

fn build_client(
    settings: &HttpSettings,
    redirect_counter: Arc<AtomicUsize>,
) -> Result<reqwest::Client, PageError> {
    let redirect_limit = settings.redirect_limit;
    let policy = reqwest::redirect::Policy::custom(move |attempt| {
        let count = attempt.previous().len();
        redirect_counter.store(count, Ordering::Relaxed);
        if count >= redirect_limit {
            attempt.error("redirect limit exceeded")
        } else {
            attempt.follow()
        }
    });

    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .user_agent(settings.user_agent.clone())
        .redirect(policy)
        .build()
        .map_err(|err| PageError::new(FailureKind::Network, err.to_string()))
}

fn parse_selector(css: &str) -> Result<Selector, PageError> {
    Selector::parse(css).map_err(|err| PageError::new(FailureKind::InvalidSelector, err.to_string()))
}

/// Elements whose text a browser never renders.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Text under `element`, without script and style contents.
fn rendered_text(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
            });
            (!hidden).then_some(&**text)
        })
        .collect()
}

fn too_large(max_bytes: u64, actual: u64) -> PageError {
    PageError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> PageError {
    if err.is_timeout() {
        return PageError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return PageError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    PageError::new(FailureKind::Network, err.to_string())
}

//! The browsing capability the pipeline runs on.
//!
//! A [`SessionOpener`] hands out one [`PageSession`] per run. The session is a
//! single page that is navigated, inspected and finally closed; every
//! operation that can block takes an explicit timeout.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::PageError;

/// Something to wait for on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// A CSS selector matches at least one element.
    Selector(String),
    /// The visible page text contains the given string.
    Text(String),
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::Selector(css) => write!(f, "selector `{css}`"),
            WaitCondition::Text(text) => write!(f, "text `{text}`"),
        }
    }
}

#[async_trait]
pub trait PageSession: Send {
    /// Load `url`, replacing whatever page was loaded before.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), PageError>;

    /// Resolve once `condition` holds, or fail with a timeout / condition error.
    async fn wait_for(
        &mut self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> Result<(), PageError>;

    /// Rendered text of the first element matching `selector`.
    async fn inner_text(&mut self, selector: &str) -> Result<String, PageError>;

    /// Full HTML of the current page.
    async fn content(&mut self) -> Result<String, PageError>;

    /// Release the page and anything it holds on to.
    async fn close(self: Box<Self>) -> Result<(), PageError>;
}

#[async_trait]
pub trait SessionOpener: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageSession>, PageError>;
}

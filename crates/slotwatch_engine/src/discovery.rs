use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use slotwatch_core::{extract_links, Link};

use crate::session::{PageSession, WaitCondition};
use crate::PageError;

/// Listing page the activity links are read from.
pub const DEFAULT_SOURCE_URL: &str = "https://sitson.pages.dev/p";
/// Container on the listing page that holds the link text.
pub const DEFAULT_CONTAINER_SELECTOR: &str = "#textDisplay";

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub source_url: String,
    pub container_selector: String,
    pub navigation_timeout: Duration,
    /// How long the container may take to render.
    pub render_wait: Duration,
    /// Extra pause after the container appears, for late API responses.
    pub settle: Duration,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            container_selector: DEFAULT_CONTAINER_SELECTOR.to_string(),
            navigation_timeout: Duration::from_secs(30),
            render_wait: Duration::from_secs(10),
            settle: Duration::from_secs(3),
        }
    }
}

/// Why discovery produced no links. Every variant ends the run quietly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryFailure {
    #[error("listing page unreachable: {0}")]
    Unreachable(PageError),
    #[error("listing container did not render: {0}")]
    NotRendered(PageError),
    #[error("listing text unreadable: {0}")]
    Unreadable(PageError),
    #[error("listing is empty")]
    EmptyContent,
    #[error("listing contains no links")]
    NoLinks,
}

/// Load the listing page and return its distinct activity links.
pub async fn discover_links(
    session: &mut dyn PageSession,
    settings: &DiscoverySettings,
) -> Result<Vec<Link>, DiscoveryFailure> {
    engine_info!("loading listing {}", settings.source_url);
    session
        .navigate(&settings.source_url, settings.navigation_timeout)
        .await
        .map_err(DiscoveryFailure::Unreachable)?;

    let container = WaitCondition::Selector(settings.container_selector.clone());
    session
        .wait_for(&container, settings.render_wait)
        .await
        .map_err(DiscoveryFailure::NotRendered)?;
    if !settings.settle.is_zero() {
        tokio::time::sleep(settings.settle).await;
    }

    let text = session
        .inner_text(&settings.container_selector)
        .await
        .map_err(DiscoveryFailure::Unreadable)?;
    if text.trim().is_empty() {
        engine_warn!("listing container is empty");
        return Err(DiscoveryFailure::EmptyContent);
    }

    let links = extract_links(Some(&text));
    if links.is_empty() {
        return Err(DiscoveryFailure::NoLinks);
    }
    engine_info!("found {} distinct link(s)", links.len());
    Ok(links)
}

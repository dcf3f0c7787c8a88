use std::fmt;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use slotwatch_core::{Availability, CapacityPattern, Link, DEFAULT_CAPACITY_LABEL};

use crate::session::{PageSession, WaitCondition};
use crate::PageError;

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub navigation_timeout: Duration,
    /// Text whose presence marks a page as an activity page.
    pub marker_text: String,
    pub marker_wait: Duration,
    /// Label in front of the `registered/maximum` counter.
    pub capacity_label: String,
    /// Pause after every probe, whatever its outcome.
    pub delay: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(20),
            marker_text: DEFAULT_CAPACITY_LABEL.to_string(),
            marker_wait: Duration::from_secs(5),
            capacity_label: DEFAULT_CAPACITY_LABEL.to_string(),
            delay: Duration::from_secs(1),
        }
    }
}

/// Why a probe found nothing to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Navigation(PageError),
    /// The marker never appeared: not an activity page, or it loaded too slowly.
    MarkerMissing,
    ContentUnavailable(PageError),
    /// Marker present but no parsable `registered/maximum` counter.
    SignalMissing,
    Full { registered: u32, maximum: u32 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Navigation(err) => write!(f, "navigation failed ({err})"),
            SkipReason::MarkerMissing => write!(f, "not an activity page or loaded too slowly"),
            SkipReason::ContentUnavailable(err) => write!(f, "content unavailable ({err})"),
            SkipReason::SignalMissing => write!(f, "no capacity counter"),
            SkipReason::Full {
                registered,
                maximum,
            } => write!(f, "full ({registered}/{maximum})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Open { remaining: u32 },
    Skipped(SkipReason),
}

impl ProbeOutcome {
    /// Open slots, with every skipped page counted as zero.
    pub fn remaining_slots(&self) -> u32 {
        match self {
            ProbeOutcome::Open { remaining } => *remaining,
            ProbeOutcome::Skipped(_) => 0,
        }
    }
}

/// Reads the registration counter of activity pages.
#[derive(Debug, Clone)]
pub struct Prober {
    settings: ProbeSettings,
    marker: WaitCondition,
    pattern: CapacityPattern,
}

impl Prober {
    pub fn new(settings: ProbeSettings) -> Self {
        let marker = WaitCondition::Text(settings.marker_text.clone());
        let pattern = CapacityPattern::new(&settings.capacity_label);
        Self {
            settings,
            marker,
            pattern,
        }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Load `url` in `session` and classify its availability. Never fails:
    /// every problem becomes a [`SkipReason`].
    pub async fn probe(&self, session: &mut dyn PageSession, url: &Link) -> ProbeOutcome {
        engine_info!("checking {}", url);
        let outcome = self.check(session, url).await;
        match &outcome {
            ProbeOutcome::Open { remaining } => engine_info!("  -> {} slot(s) open", remaining),
            ProbeOutcome::Skipped(reason) => engine_debug!("  -> skipped: {}", reason),
        }
        outcome
    }

    async fn check(&self, session: &mut dyn PageSession, url: &Link) -> ProbeOutcome {
        if let Err(err) = session
            .navigate(url.as_str(), self.settings.navigation_timeout)
            .await
        {
            return ProbeOutcome::Skipped(SkipReason::Navigation(err));
        }

        if session
            .wait_for(&self.marker, self.settings.marker_wait)
            .await
            .is_err()
        {
            return ProbeOutcome::Skipped(SkipReason::MarkerMissing);
        }

        let content = match session.content().await {
            Ok(content) => content,
            Err(err) => return ProbeOutcome::Skipped(SkipReason::ContentUnavailable(err)),
        };

        let Some(signal) = self.pattern.find(&content) else {
            return ProbeOutcome::Skipped(SkipReason::SignalMissing);
        };

        match signal.availability() {
            Availability::Open { remaining } => ProbeOutcome::Open { remaining },
            Availability::Full => ProbeOutcome::Skipped(SkipReason::Full {
                registered: signal.registered,
                maximum: signal.maximum,
            }),
        }
    }
}

impl Default for Prober {
    fn default() -> Self {
        Self::new(ProbeSettings::default())
    }
}

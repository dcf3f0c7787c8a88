use std::panic::AssertUnwindSafe;

use engine_logging::{engine_error, engine_info, engine_warn, set_phase, RunPhase};
use futures_util::FutureExt;
use slotwatch_core::RunReport;

use crate::discovery::{discover_links, DiscoveryFailure, DiscoverySettings};
use crate::notify::{Notifier, NotifyError};
use crate::prober::{ProbeSettings, Prober};
use crate::session::{PageSession, SessionOpener};
use crate::PageError;

#[derive(Debug, Clone, Default)]
pub struct WatchSettings {
    pub discovery: DiscoverySettings,
    pub probe: ProbeSettings,
}

#[derive(Debug)]
pub enum Delivery {
    Sent,
    Failed(NotifyError),
}

/// Terminal state of one run.
#[derive(Debug)]
pub enum RunOutcome {
    NoLinksFound(DiscoveryFailure),
    CompletedEmpty {
        probed: usize,
    },
    CompletedWithResults {
        probed: usize,
        report: RunReport,
        delivery: Delivery,
    },
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::NoLinksFound(_) => "no-links-found",
            RunOutcome::CompletedEmpty { .. } => "completed-empty",
            RunOutcome::CompletedWithResults { .. } => "completed-with-results",
        }
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::CompletedWithResults { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Discovery, sequential probing and a single alert, over one page session.
pub struct Pipeline {
    discovery: DiscoverySettings,
    prober: Prober,
    notifier: Box<dyn Notifier>,
}

impl Pipeline {
    pub fn new(settings: WatchSettings, notifier: Box<dyn Notifier>) -> Self {
        Self {
            discovery: settings.discovery,
            prober: Prober::new(settings.probe),
            notifier,
        }
    }

    /// Open a session, run once, and close the session again on every path.
    ///
    /// Only failing to open the session is an error; a panic inside the run is
    /// re-raised after the session has been closed.
    pub async fn run(&self, opener: &dyn SessionOpener) -> Result<RunOutcome, PageError> {
        let mut session = opener.open().await?;

        let result = AssertUnwindSafe(self.run_with_session(session.as_mut()))
            .catch_unwind()
            .await;

        if let Err(err) = session.close().await {
            engine_warn!("failed to close page session: {}", err);
        }
        set_phase(RunPhase::Idle);

        match result {
            Ok(outcome) => Ok(outcome),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// One pass over an already-open session. The session is left open.
    pub async fn run_with_session(&self, session: &mut dyn PageSession) -> RunOutcome {
        set_phase(RunPhase::Discovery);
        let links = match discover_links(session, &self.discovery).await {
            Ok(links) => links,
            Err(failure) => {
                engine_warn!("no links found, ending run: {}", failure);
                return RunOutcome::NoLinksFound(failure);
            }
        };

        set_phase(RunPhase::Probe);
        let mut report = RunReport::new();
        let delay = self.prober.settings().delay;
        for link in &links {
            let outcome = self.prober.probe(session, link).await;
            report.record(link.clone(), outcome.remaining_slots());
            tokio::time::sleep(delay).await;
        }
        let probed = links.len();

        if report.is_empty() {
            engine_info!("checked {} activities, all full", probed);
            return RunOutcome::CompletedEmpty { probed };
        }

        set_phase(RunPhase::Notify);
        engine_info!(
            "{} of {} activities have open slots ({} total)",
            report.len(),
            probed,
            report.total_slots()
        );
        let delivery = match self.notifier.notify(report.results()).await {
            Ok(()) => {
                engine_info!("alert sent");
                Delivery::Sent
            }
            Err(err) => {
                engine_error!("alert could not be sent: {}", err);
                Delivery::Failed(err)
            }
        };

        RunOutcome::CompletedWithResults {
            probed,
            report,
            delivery,
        }
    }
}

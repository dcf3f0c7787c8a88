//! Slotwatch engine: page sessions, probing, and the run pipeline.
mod chromium;
mod decode;
mod discovery;
mod http;
mod notify;
mod pipeline;
mod prober;
mod session;
mod types;

pub use chromium::{find_chromium, ChromiumOpener, ChromiumSession, CHROME_PATH_ENV};
pub use decode::{decode_page, DecodedPage};
pub use discovery::{
    discover_links, DiscoveryFailure, DiscoverySettings, DEFAULT_CONTAINER_SELECTOR,
    DEFAULT_SOURCE_URL,
};
pub use http::{HttpOpener, HttpSession, HttpSettings};
pub use notify::{MailSettings, Notifier, NotifyError, SmtpNotifier};
pub use pipeline::{Delivery, Pipeline, RunOutcome, WatchSettings};
pub use prober::{ProbeOutcome, ProbeSettings, Prober, SkipReason};
pub use session::{PageSession, SessionOpener, WaitCondition};
pub use types::{FailureKind, PageError};

//! Slotwatch core: pure parsing, classification and formatting.
mod alert;
mod capacity;
mod links;
mod report;

pub use alert::{compose_alert, escape_html, AlertMessage};
pub use capacity::{Availability, CapacityPattern, CapacitySignal, DEFAULT_CAPACITY_LABEL};
pub use links::{extract_links, Link, LINK_PATTERN};
pub use report::{ProbeResult, RunReport};

use crate::links::Link;

/// An activity with at least one open slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub url: Link,
    pub remaining_slots: u32,
}

/// Positive probe results of one run, in probe order.
///
/// Zero-slot results are dropped on the way in, so every entry has
/// `remaining_slots > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    results: Vec<ProbeResult>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `url` if it has open slots. Returns whether it was kept.
    pub fn record(&mut self, url: Link, remaining_slots: u32) -> bool {
        if remaining_slots == 0 {
            return false;
        }
        self.results.push(ProbeResult {
            url,
            remaining_slots,
        });
        true
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn results(&self) -> &[ProbeResult] {
        &self.results
    }

    pub fn total_slots(&self) -> u64 {
        self.results
            .iter()
            .map(|r| u64::from(r.remaining_slots))
            .sum()
    }

    pub fn into_results(self) -> Vec<ProbeResult> {
        self.results
    }
}

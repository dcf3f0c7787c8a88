use regex::Regex;

/// Label that precedes the registration counter on activity pages.
pub const DEFAULT_CAPACITY_LABEL: &str = "已报人数";

/// A `registered/maximum` counter read from an activity page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacitySignal {
    pub registered: u32,
    pub maximum: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Open { remaining: u32 },
    Full,
}

impl CapacitySignal {
    pub fn availability(&self) -> Availability {
        if self.registered < self.maximum {
            Availability::Open {
                remaining: self.maximum - self.registered,
            }
        } else {
            Availability::Full
        }
    }

    /// Open slots, or 0 when the activity is full or over-subscribed.
    pub fn remaining(&self) -> u32 {
        match self.availability() {
            Availability::Open { remaining } => remaining,
            Availability::Full => 0,
        }
    }
}

/// Matcher for `<label>：<registered>/<maximum>` (full-width colon).
///
/// Counts may be written with ASCII or full-width digits.
#[derive(Debug, Clone)]
pub struct CapacityPattern {
    label: String,
    re: Regex,
}

impl CapacityPattern {
    pub fn new(label: &str) -> Self {
        let pattern = format!(
            r"{}：([0-9０-９]+)/([0-9０-９]+)",
            regex::escape(label)
        );
        // The label is escaped, so the composed pattern always compiles.
        let re = Regex::new(&pattern).expect("escaped capacity pattern is valid");
        Self {
            label: label.to_string(),
            re,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The first counter in `content`. `None` when there is no counter or
    /// its numbers do not fit in `u32`; later counters are not consulted.
    pub fn find(&self, content: &str) -> Option<CapacitySignal> {
        let caps = self.re.captures(content)?;
        Some(CapacitySignal {
            registered: parse_count(caps.get(1)?.as_str())?,
            maximum: parse_count(caps.get(2)?.as_str())?,
        })
    }
}

fn parse_count(digits: &str) -> Option<u32> {
    digits.chars().try_fold(0u32, |acc, ch| {
        let digit = match ch {
            '０'..='９' => ch as u32 - '０' as u32,
            _ => ch.to_digit(10)?,
        };
        acc.checked_mul(10)?.checked_add(digit)
    })
}

impl Default for CapacityPattern {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_LABEL)
    }
}

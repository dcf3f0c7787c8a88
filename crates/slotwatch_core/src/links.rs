use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Pattern used to pick activity URLs out of free text.
pub const LINK_PATTERN: &str = r#"https?://[^\s,;"'<>]+"#;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(LINK_PATTERN).expect("link pattern is valid"));

/// A candidate activity URL as it appeared in the listing text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link(String);

impl Link {
    /// Wrap a URL string without checking it against [`LINK_PATTERN`].
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Link {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract every distinct `http`/`https` URL from `text`, in first-seen order.
///
/// Missing or empty text yields no links. Matches are not validated beyond the
/// pattern; a malformed URL simply fails later when it is probed.
pub fn extract_links(text: Option<&str>) -> Vec<Link> {
    let Some(text) = text else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    LINK_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|url| seen.insert(*url))
        .map(|url| Link(url.to_string()))
        .collect()
}

//! Hostname classification.
//!
//! Matching is exact and case-sensitive: `m.youtube.com` is not blocked just
//! because `youtube.com` is. Hostname extraction never fails; anything that
//! cannot be read yields the empty string, which no blocklist contains.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Hosts blocked when no configuration overrides the list.
pub const DEFAULT_BLOCKED_SITES: [&str; 4] = [
    "youtube.com",
    "www.youtube.com",
    "instagram.com",
    "www.instagram.com",
];

/// Permissive pattern for raw document URLs seen before `location` is usable.
static RAW_HOST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://([^/]+)").expect("static pattern is valid"));

/// Static set of exact hostnames subject to blocking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blocklist {
    hosts: BTreeSet<String>,
}

impl Default for Blocklist {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKED_SITES)
    }
}

impl Blocklist {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `hostname` is listed verbatim.
    pub fn is_blocked(&self, hostname: &str) -> bool {
        !hostname.is_empty() && self.hosts.contains(hostname)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Resolve the hostname of the current page.
///
/// `location` is the navigation API's view of the URL, `None` when that API is
/// not usable yet. `raw_url` is the document URL string, used only when
/// `location` is missing or unparseable. A parsed location without a host
/// (`about:blank`, `data:`) yields `""`.
pub fn hostname_of(location: Option<&str>, raw_url: &str) -> String {
    match location.map(Url::parse) {
        Some(Ok(url)) => url.host_str().unwrap_or_default().to_string(),
        _ => hostname_from_raw(raw_url),
    }
}

fn hostname_from_raw(raw_url: &str) -> String {
    RAW_HOST_PATTERN
        .captures(raw_url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

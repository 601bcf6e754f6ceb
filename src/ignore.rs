//! Exclusion of non-data resources.
//!
//! Coordination services keep bookkeeping resources (aggregation tasks,
//! triggers, stats reports) next to the partition-bearing ones. Those never
//! correspond to source partitions, so every topology operation skips them
//! in both the source and destination enumeration.

use std::collections::BTreeSet;

/// Keywords excluded when a configuration does not name its own.
pub const DEFAULT_IGNORE_KEYWORDS: &[&str] = &["aggregation", "trigger", "stats"];

/// A set of substrings identifying resources to leave alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreSet {
    keywords: BTreeSet<String>,
}

impl IgnoreSet {
    /// Create an ignore set from keywords. Empty keywords are dropped since
    /// they would match every resource.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(Into::into)
                .filter(|k: &String| !k.is_empty())
                .collect(),
        }
    }

    /// The first keyword contained in `resource`, if any.
    pub fn matching_keyword(&self, resource: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|k| resource.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn is_ignored(&self, resource: &str) -> bool {
        self.matching_keyword(resource).is_some()
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE_KEYWORDS.iter().copied())
    }
}

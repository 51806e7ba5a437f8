//! Test name filtering module
//!
//! This module provides the glob-style name filter that selects tests by their
//! full `Suite.Test` name.
//!
//! A filter is a `:`-separated list of positive patterns, optionally followed by
//! `-` and a `:`-separated list of negative patterns. A test is selected when its
//! full name matches at least one positive pattern and no negative pattern.

use crate::config::ConfigError;

/// Filter that matches every test
pub const UNIVERSAL_FILTER: &str = "*";

/// Patterns that mark a suite or test name as disabled
///
/// The second one covers instantiated names such as `Inst/DISABLED_Suite`.
pub const DISABLED_PATTERNS: [&str; 2] = ["DISABLED_*", "*/DISABLED_*"];

/// Match `name` against a glob `pattern` as a whole string
///
/// `*` matches any substring, `?` matches any single character and every other
/// character matches itself.
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    // Position after the last `*` and the name position it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p + 1, n));
                p += 1;
            }
            Some('?') => {
                p += 1;
                n += 1;
            }
            Some(&c) if c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star_p, star_n)) => {
                    p = star_p;
                    n = star_n + 1;
                    backtrack = Some((star_p, star_n + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// True when the suite or the test is disabled by name
pub fn is_disabled_name(suite: &str, test: &str) -> bool {
    [suite, test].iter().any(|name| {
        DISABLED_PATTERNS
            .iter()
            .any(|pattern| pattern_matches(pattern, name))
    })
}

/// Parsed positive and negative pattern lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFilter {
    source: String,
    positive: Vec<String>,
    negative: Vec<String>,
}

impl TestFilter {
    /// Parse a filter string
    ///
    /// Whitespace or control characters make the filter malformed. An empty
    /// positive section selects every test.
    pub fn parse(filter: &str) -> Result<Self, ConfigError> {
        if let Some(bad) = filter
            .chars()
            .find(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ConfigError::InvalidFilter {
                filter: filter.to_owned(),
                reason: format!("contains forbidden character {bad:?}"),
            });
        }

        let (positive, negative) = match filter.split_once('-') {
            Some((positive, negative)) => (positive, Some(negative)),
            None => (filter, None),
        };

        let positive = if positive.is_empty() {
            UNIVERSAL_FILTER
        } else {
            positive
        };

        Ok(Self {
            source: filter.to_owned(),
            positive: Self::split_patterns(positive),
            negative: negative.map(Self::split_patterns).unwrap_or_default(),
        })
    }

    /// The filter matching every test
    pub fn universal() -> Self {
        Self {
            source: UNIVERSAL_FILTER.to_owned(),
            positive: vec![UNIVERSAL_FILTER.to_owned()],
            negative: Vec::new(),
        }
    }

    fn split_patterns(section: &str) -> Vec<String> {
        section.split(':').map(ToOwned::to_owned).collect()
    }

    /// The filter text as given
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_universal(&self) -> bool {
        self.source == UNIVERSAL_FILTER
    }

    pub fn positive_patterns(&self) -> &[String] {
        &self.positive
    }

    pub fn negative_patterns(&self) -> &[String] {
        &self.negative
    }

    /// Match a full `Suite.Test` name
    pub fn matches_name(&self, full_name: &str) -> bool {
        self.positive
            .iter()
            .any(|pattern| pattern_matches(pattern, full_name))
            && !self
                .negative
                .iter()
                .any(|pattern| pattern_matches(pattern, full_name))
    }

    /// Match a test by its suite and test names
    pub fn matches(&self, suite: &str, test: &str) -> bool {
        self.matches_name(&format!("{suite}.{test}"))
    }
}

impl Default for TestFilter {
    fn default() -> Self {
        Self::universal()
    }
}

impl std::str::FromStr for TestFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

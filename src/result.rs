//! Test result model
//!
//! This module provides the outcome holders shared by tests, suites and the
//! whole program: part results recorded by assertions, key-value properties,
//! and the [`TestResult`] that aggregates them.

use std::fmt;
use std::time::Duration;

/// Where an assertion or failure originated
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// Source file, `None` when unknown
    pub file: Option<String>,
    /// Line number, `None` when unknown
    pub line: Option<u32>,
}

impl SourceLocation {
    /// Create a location from a file and line
    pub fn new<S: Into<String>>(file: S, line: u32) -> Self {
        Self {
            file: Some(file.into()),
            line: Some(line),
        }
    }

    /// A location for failures that have no source position
    pub const fn unknown() -> Self {
        Self {
            file: None,
            line: None,
        }
    }

    /// Location of the caller of a `#[track_caller]` function
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(std::panic::Location::caller())
    }
}

impl From<&std::panic::Location<'_>> for SourceLocation {
    fn from(location: &std::panic::Location<'_>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (None, _) => write!(f, "unknown file:"),
            (Some(file), None) => write!(f, "{file}:"),
            (Some(file), Some(line)) => write!(f, "{file}:{line}:"),
        }
    }
}

/// Severity of a single part result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Success,
    NonFatalFailure,
    FatalFailure,
    Skip,
}

/// One assertion outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPartResult {
    kind: PartKind,
    location: SourceLocation,
    message: String,
}

impl TestPartResult {
    pub fn new<S: Into<String>>(kind: PartKind, location: SourceLocation, message: S) -> Self {
        Self {
            kind,
            location,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> PartKind {
        self.kind
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn passed(&self) -> bool {
        self.kind == PartKind::Success
    }

    pub fn skipped(&self) -> bool {
        self.kind == PartKind::Skip
    }

    /// True for both fatal and non-fatal failures
    pub fn failed(&self) -> bool {
        self.fatally_failed() || self.nonfatally_failed()
    }

    pub fn fatally_failed(&self) -> bool {
        self.kind == PartKind::FatalFailure
    }

    pub fn nonfatally_failed(&self) -> bool {
        self.kind == PartKind::NonFatalFailure
    }
}

impl fmt::Display for TestPartResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            PartKind::Success => "Success",
            PartKind::NonFatalFailure | PartKind::FatalFailure => "Failure",
            PartKind::Skip => "Skipped",
        };
        write!(f, "{} {label}\n{}", self.location, self.message)
    }
}

/// A user-recorded key-value pair attached to a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestProperty {
    key: String,
    value: String,
}

impl TestProperty {
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Report element a property is attached to
///
/// Each element reserves the attribute names a report writer emits itself,
/// so user properties may not reuse them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyScope {
    /// Properties of a single test
    TestCase,
    /// Properties recorded while a suite is current but no test is
    TestSuite,
    /// Properties recorded outside any suite
    TestSuites,
}

impl PropertyScope {
    /// Attribute names that user properties may not use in this scope
    pub fn reserved_attributes(self) -> &'static [&'static str] {
        match self {
            PropertyScope::TestSuites => &[
                "disabled",
                "errors",
                "failures",
                "name",
                "random_seed",
                "tests",
                "time",
                "timestamp",
            ],
            PropertyScope::TestSuite => &[
                "disabled",
                "errors",
                "failures",
                "name",
                "tests",
                "time",
                "timestamp",
            ],
            PropertyScope::TestCase => &[
                "classname",
                "name",
                "status",
                "time",
                "type_param",
                "value_param",
                "file",
                "line",
            ],
        }
    }

    pub fn is_reserved(self, key: &str) -> bool {
        self.reserved_attributes().contains(&key)
    }
}

/// Rejection of a property whose key is reserved in its scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedKey {
    pub key: String,
    pub scope: PropertyScope,
}

impl fmt::Display for ReservedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reserved key used in record_property(): {} ({} are reserved)",
            self.key,
            format_word_list(self.scope.reserved_attributes())
        )
    }
}

impl std::error::Error for ReservedKey {}

/// Formats `["a", "b", "c"]` as `'a', 'b', and 'c'`
fn format_word_list(words: &[&str]) -> String {
    let mut list = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 && words.len() > 2 {
            list.push_str(", ");
        } else if i > 0 {
            list.push(' ');
        }
        if i + 1 == words.len() && words.len() > 1 {
            list.push_str("and ");
        }
        list.push('\'');
        list.push_str(word);
        list.push('\'');
    }
    list
}

/// Outcome holder for a test, a suite's ad hoc work, or the whole program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestResult {
    parts: Vec<TestPartResult>,
    properties: Vec<TestProperty>,
    death_test_count: u32,
    start_timestamp: u64,
    elapsed: Duration,
}

impl TestResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_part(&mut self, part: TestPartResult) {
        self.parts.push(part);
    }

    pub fn parts(&self) -> &[TestPartResult] {
        &self.parts
    }

    pub fn part(&self, i: usize) -> Option<&TestPartResult> {
        self.parts.get(i)
    }

    pub fn total_part_count(&self) -> usize {
        self.parts.len()
    }

    /// Record a property, replacing the value of an existing key
    pub fn record_property(
        &mut self,
        scope: PropertyScope,
        property: TestProperty,
    ) -> Result<(), ReservedKey> {
        if scope.is_reserved(property.key()) {
            return Err(ReservedKey {
                key: property.key,
                scope,
            });
        }

        match self
            .properties
            .iter_mut()
            .find(|existing| existing.key == property.key)
        {
            Some(existing) => existing.value = property.value,
            None => self.properties.push(property),
        }
        Ok(())
    }

    pub fn properties(&self) -> &[TestProperty] {
        &self.properties
    }

    pub fn property(&self, i: usize) -> Option<&TestProperty> {
        self.properties.get(i)
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub fn death_test_count(&self) -> u32 {
        self.death_test_count
    }

    /// Increment the death test counter and return the new value
    pub fn increment_death_test_count(&mut self) -> u32 {
        self.death_test_count += 1;
        self.death_test_count
    }

    /// Start time in milliseconds since the UNIX epoch
    pub fn start_timestamp(&self) -> u64 {
        self.start_timestamp
    }

    pub fn elapsed_time(&self) -> Duration {
        self.elapsed
    }

    pub(crate) fn set_start_timestamp(&mut self, start: u64) {
        self.start_timestamp = start;
    }

    pub(crate) fn set_elapsed_time(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    pub fn passed(&self) -> bool {
        !self.skipped() && !self.failed()
    }

    pub fn skipped(&self) -> bool {
        !self.failed() && self.parts.iter().any(TestPartResult::skipped)
    }

    pub fn failed(&self) -> bool {
        self.parts.iter().any(TestPartResult::failed)
    }

    pub fn has_fatal_failure(&self) -> bool {
        self.parts.iter().any(TestPartResult::fatally_failed)
    }

    pub fn has_nonfatal_failure(&self) -> bool {
        self.parts.iter().any(TestPartResult::nonfatally_failed)
    }

    /// Reset for a new iteration; the start timestamp is kept
    pub fn clear(&mut self) {
        self.parts.clear();
        self.properties.clear();
        self.death_test_count = 0;
        self.elapsed = Duration::ZERO;
    }
}

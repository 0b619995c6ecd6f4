//! Confirmed differences for one document pair.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::comparison::{ComparisonEntry, ComparisonKind};

/// A mismatch that survived tolerance adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difference {
    kind: ComparisonKind,
    path: String,
    expected: Option<String>,
    actual: Option<String>,
}

impl Difference {
    pub fn new(
        kind: ComparisonKind,
        path: impl Into<String>,
        expected: Option<String>,
        actual: Option<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            expected,
            actual,
        }
    }

    /// Build from a comparison entry. The control path is preferred; entries
    /// for test-only nodes fall back to the test path.
    pub fn from_entry(entry: ComparisonEntry) -> Self {
        let path = entry
            .control_path
            .or(entry.test_path)
            .unwrap_or_default();
        Self {
            kind: entry.kind,
            path,
            expected: entry.control_value,
            actual: entry.test_value,
        }
    }

    pub fn kind(&self) -> ComparisonKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Control-side value
    pub fn expected(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    /// Test-side value
    pub fn actual(&self) -> Option<&str> {
        self.actual.as_deref()
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Difference at: {}. Expected: {}. But was: {}",
            self.path,
            self.expected.as_deref().unwrap_or("null"),
            self.actual.as_deref().unwrap_or("null")
        )
    }
}

/// Differences in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    differences: Vec<Difference>,
}

impl DiffReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, difference: Difference) {
        self.differences.push(difference);
    }

    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }

    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    pub fn len(&self) -> usize {
        self.differences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Difference> {
        self.differences.iter()
    }
}

impl<'a> IntoIterator for &'a DiffReport {
    type Item = &'a Difference;
    type IntoIter = std::slice::Iter<'a, Difference>;

    fn into_iter(self) -> Self::IntoIter {
        self.differences.iter()
    }
}

//! Ignore-set membership for nodes.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Node names excluded from comparison, together with their subtrees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IgnoreSet(BTreeSet<String>);

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `;`-separated names, e.g. `"debug; timestamp;"`.
    /// Entries are trimmed and empty entries dropped.
    pub fn from_delimited(list: &str) -> Self {
        list.split(';').collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Merge another set into this one.
    pub fn extend_from(&mut self, other: &IgnoreSet) {
        self.0.extend(other.0.iter().cloned());
    }
}

impl<S: AsRef<str>> FromIterator<S> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|name| name.as_ref().trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }
}

impl fmt::Display for IgnoreSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", name)?;
        }
        write!(f, "]")
    }
}

/// `false` iff the node named `node_name` is excluded from comparison.
pub fn should_compare(node_name: &str, ignore_set: &IgnoreSet) -> bool {
    !ignore_set.contains(node_name)
}

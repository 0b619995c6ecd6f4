//! Single comparisons between a control node and a test node, and the
//! evaluator deciding whether a raw mismatch is a real difference.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalizer::{Epsilon, is_equal, parse_number};

/// What was compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonKind {
    /// Names of a paired control and test node
    TagName,
    /// An attribute, by name, on a paired element
    Attribute,
    /// Value of a paired text node
    TextValue,
    /// Number of compared children of a paired element
    ChildCount,
    /// Position of a matched child among the compared children of its parent
    ChildOrder,
    /// A control node without counterpart in the test document
    OnlyInControl,
    /// A test node without counterpart in the control document
    OnlyInTest,
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ComparisonKind::TagName => "tag name",
            ComparisonKind::Attribute => "attribute",
            ComparisonKind::TextValue => "text value",
            ComparisonKind::ChildCount => "child count",
            ComparisonKind::ChildOrder => "child order",
            ComparisonKind::OnlyInControl => "only in control",
            ComparisonKind::OnlyInTest => "only in test",
        };
        f.write_str(label)
    }
}

/// Outcome of one comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonResult {
    Equal,
    Different,
}

/// One comparison performed by the tree comparator.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonEntry {
    pub kind: ComparisonKind,
    pub control_path: Option<String>,
    pub test_path: Option<String>,
    pub control_value: Option<String>,
    pub test_value: Option<String>,
}

impl ComparisonEntry {
    /// Outcome before any evaluator runs: exact equality of the values.
    pub fn raw_outcome(&self) -> ComparisonResult {
        if self.control_value == self.test_value {
            ComparisonResult::Equal
        } else {
            ComparisonResult::Different
        }
    }
}

/// Turns the raw outcome of a comparison into the final one.
pub trait DifferenceEvaluator {
    fn evaluate(&self, entry: &ComparisonEntry, outcome: ComparisonResult) -> ComparisonResult;
}

impl<F> DifferenceEvaluator for F
where
    F: Fn(&ComparisonEntry, ComparisonResult) -> ComparisonResult,
{
    fn evaluate(&self, entry: &ComparisonEntry, outcome: ComparisonResult) -> ComparisonResult {
        self(entry, outcome)
    }
}

/// Downgrades numeric text and attribute mismatches within `epsilon` to
/// `Equal`. Every other outcome passes through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceEvaluator {
    epsilon: Epsilon,
}

impl ToleranceEvaluator {
    pub fn new(epsilon: Epsilon) -> Self {
        Self { epsilon }
    }

    pub fn epsilon(&self) -> Epsilon {
        self.epsilon
    }
}

impl DifferenceEvaluator for ToleranceEvaluator {
    fn evaluate(&self, entry: &ComparisonEntry, outcome: ComparisonResult) -> ComparisonResult {
        if outcome == ComparisonResult::Equal {
            return outcome;
        }
        if !matches!(
            entry.kind,
            ComparisonKind::TextValue | ComparisonKind::Attribute
        ) {
            return outcome;
        }

        match (entry.control_value.as_deref(), entry.test_value.as_deref()) {
            (Some(control), Some(test))
                if parse_number(control).is_some() && parse_number(test).is_some() =>
            {
                if is_equal(control, test, self.epsilon) {
                    ComparisonResult::Equal
                } else {
                    outcome
                }
            }
            _ => outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: ComparisonKind, control: Option<&str>, test: Option<&str>) -> ComparisonEntry {
        ComparisonEntry {
            kind,
            control_path: Some("/root/v".to_string()),
            test_path: Some("/root/v".to_string()),
            control_value: control.map(str::to_string),
            test_value: test.map(str::to_string),
        }
    }

    #[test]
    fn test_raw_outcome() {
        let same = entry(ComparisonKind::TextValue, Some("a"), Some("a"));
        assert_eq!(same.raw_outcome(), ComparisonResult::Equal);

        let missing = entry(ComparisonKind::OnlyInControl, Some("b"), None);
        assert_eq!(missing.raw_outcome(), ComparisonResult::Different);
    }

    #[test]
    fn test_tolerance_absorbs_small_numeric_difference() {
        let evaluator = ToleranceEvaluator::new(Epsilon::new(0.001).unwrap());
        let text = entry(ComparisonKind::TextValue, Some("1.000"), Some("1.0004"));
        assert_eq!(
            evaluator.evaluate(&text, text.raw_outcome()),
            ComparisonResult::Equal
        );

        let attr = entry(ComparisonKind::Attribute, Some("2"), Some("2.0005"));
        assert_eq!(
            evaluator.evaluate(&attr, attr.raw_outcome()),
            ComparisonResult::Equal
        );
    }

    #[test]
    fn test_tolerance_keeps_large_difference() {
        let evaluator = ToleranceEvaluator::new(Epsilon::new(0.0001).unwrap());
        let text = entry(ComparisonKind::TextValue, Some("1.000"), Some("1.0004"));
        assert_eq!(
            evaluator.evaluate(&text, text.raw_outcome()),
            ComparisonResult::Different
        );
    }

    #[test]
    fn test_tolerance_ignores_structural_kinds() {
        let evaluator = ToleranceEvaluator::new(Epsilon::new(100.0).unwrap());
        let count = entry(ComparisonKind::ChildCount, Some("2"), Some("3"));
        assert_eq!(
            evaluator.evaluate(&count, count.raw_outcome()),
            ComparisonResult::Different
        );

        let order = entry(ComparisonKind::ChildOrder, Some("0"), Some("1"));
        assert_eq!(
            evaluator.evaluate(&order, order.raw_outcome()),
            ComparisonResult::Different
        );

        let only = entry(ComparisonKind::OnlyInControl, Some("1"), None);
        assert_eq!(
            evaluator.evaluate(&only, only.raw_outcome()),
            ComparisonResult::Different
        );
    }

    #[test]
    fn test_tolerance_leaves_text_mismatch() {
        let evaluator = ToleranceEvaluator::new(Epsilon::new(1.0).unwrap());
        let text = entry(ComparisonKind::TextValue, Some("abc"), Some("abd"));
        assert_eq!(
            evaluator.evaluate(&text, text.raw_outcome()),
            ComparisonResult::Different
        );
    }

    #[test]
    fn test_closure_evaluator() {
        let everything_equal = |_: &ComparisonEntry, _: ComparisonResult| ComparisonResult::Equal;
        let text = entry(ComparisonKind::TextValue, Some("x"), Some("y"));
        assert_eq!(
            everything_equal.evaluate(&text, ComparisonResult::Different),
            ComparisonResult::Equal
        );
    }
}

//! Lockstep traversal of a control tree and a test tree.
//!
//! The walk is a depth-first state machine over an explicit stack of
//! frames. Each frame holds one matched control/test pair and moves through
//! three states:
//!
//! - `Entering`: the pair itself is compared (name, attributes, text) and
//!   its compared children are paired by name, first unconsumed test child
//!   in encounter order.
//! - `ChildrenPending`: control children are visited one at a time. A
//!   paired child has its position among the paired siblings checked on
//!   both sides, then gets a frame of its own.
//! - `Resolved`: test children never consumed are reported and the frame is
//!   popped.
//!
//! Differences therefore come out in control-document pre-order, with the
//! test-only nodes of a parent following everything found beneath it.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::comparison::{
    ComparisonEntry, ComparisonKind, ComparisonResult, DifferenceEvaluator, ToleranceEvaluator,
};
use crate::document::{NodeKind, XmlDocument, XmlNode};
use crate::filter::{IgnoreSet, should_compare};
use crate::matcher::find_match;
use crate::normalizer::{Epsilon, normalize_whitespace};
use crate::report::{DiffReport, Difference};

/// Everything that configures one comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonSettings {
    /// Numeric tolerance for text and attribute values
    pub epsilon: Epsilon,
    /// Node names excluded together with their subtrees
    #[serde(alias = "ignored_nodes")]
    pub ignore_set: IgnoreSet,
    /// Also report parents whose number of compared children differs
    pub report_child_count: bool,
}

/// Compare two documents with the default tolerance evaluator.
pub fn compare(
    control: &XmlDocument,
    test: &XmlDocument,
    ignore_set: &IgnoreSet,
    epsilon: Epsilon,
) -> DiffReport {
    TreeComparator::new(ignore_set, epsilon).compare(control, test)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Entering,
    ChildrenPending,
    Resolved,
}

struct Frame<'n> {
    control: &'n XmlNode,
    test: &'n XmlNode,
    state: VisitState,
    next_child: usize,
    /// Test child index paired with each control child
    pairs: Vec<Option<usize>>,
    consumed: Vec<bool>,
    /// For each test child, how many paired test children precede it
    test_ranks: Vec<usize>,
    /// Paired control children visited so far
    control_rank: usize,
}

impl<'n> Frame<'n> {
    fn new(control: &'n XmlNode, test: &'n XmlNode) -> Self {
        Self {
            control,
            test,
            state: VisitState::Entering,
            next_child: 0,
            pairs: Vec::new(),
            consumed: Vec::new(),
            test_ranks: Vec::new(),
            control_rank: 0,
        }
    }

    fn pair_children(&mut self, participates: impl Fn(&XmlNode) -> bool) {
        let test_children = self.test.children();
        let mut consumed = vec![false; test_children.len()];

        self.pairs = self
            .control
            .children()
            .iter()
            .map(|child| {
                if !participates(child) {
                    return None;
                }
                let index = find_match(child, test_children, &consumed)?;
                consumed[index] = true;
                Some(index)
            })
            .collect();

        self.test_ranks = consumed
            .iter()
            .scan(0, |rank, &used| {
                let current = *rank;
                *rank += usize::from(used);
                Some(current)
            })
            .collect();
        self.consumed = consumed;
    }
}

/// Produces a `DiffReport` for a control/test document pair.
pub struct TreeComparator<'a, E = ToleranceEvaluator> {
    ignore_set: &'a IgnoreSet,
    evaluator: E,
    report_child_count: bool,
}

impl<'a> TreeComparator<'a, ToleranceEvaluator> {
    pub fn new(ignore_set: &'a IgnoreSet, epsilon: Epsilon) -> Self {
        Self {
            ignore_set,
            evaluator: ToleranceEvaluator::new(epsilon),
            report_child_count: false,
        }
    }

    pub fn from_settings(settings: &'a ComparisonSettings) -> Self {
        Self::new(&settings.ignore_set, settings.epsilon)
            .report_child_count(settings.report_child_count)
    }
}

impl<'a, E: DifferenceEvaluator> TreeComparator<'a, E> {
    /// Replace the evaluator deciding which raw mismatches are differences.
    pub fn with_evaluator<F: DifferenceEvaluator>(self, evaluator: F) -> TreeComparator<'a, F> {
        TreeComparator {
            ignore_set: self.ignore_set,
            evaluator,
            report_child_count: self.report_child_count,
        }
    }

    pub fn report_child_count(mut self, enabled: bool) -> Self {
        self.report_child_count = enabled;
        self
    }

    pub fn compare(&self, control: &XmlDocument, test: &XmlDocument) -> DiffReport {
        let mut report = DiffReport::new();
        let control_root = control.root();
        let test_root = test.root();

        match (self.participates(control_root), self.participates(test_root)) {
            (true, true) => self.walk(control_root, test_root, &mut report),
            (true, false) => self.record(only_in_control(control_root), &mut report),
            (false, true) => self.record(only_in_test(test_root), &mut report),
            (false, false) => {}
        }

        debug!(
            control = %control.source_id(),
            test = %test.source_id(),
            differences = report.len(),
            "comparison finished"
        );
        report
    }

    fn participates(&self, node: &XmlNode) -> bool {
        should_compare(node.name(), self.ignore_set)
    }

    fn walk(&self, control: &XmlNode, test: &XmlNode, report: &mut DiffReport) {
        let mut stack = vec![Frame::new(control, test)];

        while let Some(frame) = stack.last_mut() {
            match frame.state {
                VisitState::Entering => {
                    trace!(path = %frame.control.path(), "entering");
                    self.compare_pair(frame.control, frame.test, report);
                    frame.pair_children(|node| self.participates(node));
                    frame.state = VisitState::ChildrenPending;
                }
                VisitState::ChildrenPending => {
                    let control = frame.control;
                    let test = frame.test;
                    let position = frame.next_child;
                    let Some(child) = control.children().get(position) else {
                        frame.state = VisitState::Resolved;
                        continue;
                    };
                    frame.next_child += 1;

                    if !self.participates(child) {
                        trace!(path = %child.path(), name = %child.name(), "ignored");
                        continue;
                    }

                    match frame.pairs[position] {
                        Some(index) => {
                            let counterpart = &test.children()[index];
                            let control_rank = frame.control_rank;
                            frame.control_rank += 1;
                            self.record(
                                ComparisonEntry {
                                    kind: ComparisonKind::ChildOrder,
                                    control_path: Some(child.path().to_string()),
                                    test_path: Some(counterpart.path().to_string()),
                                    control_value: Some(control_rank.to_string()),
                                    test_value: Some(frame.test_ranks[index].to_string()),
                                },
                                report,
                            );
                            stack.push(Frame::new(child, counterpart));
                        }
                        None => self.record(only_in_control(child), report),
                    }
                }
                VisitState::Resolved => {
                    let test = frame.test;
                    let consumed = std::mem::take(&mut frame.consumed);
                    stack.pop();

                    for (child, used) in test.children().iter().zip(consumed) {
                        if !used && self.participates(child) {
                            self.record(only_in_test(child), report);
                        }
                    }
                }
            }
        }
    }

    fn compare_pair(&self, control: &XmlNode, test: &XmlNode, report: &mut DiffReport) {
        self.record(
            ComparisonEntry {
                kind: ComparisonKind::TagName,
                control_path: Some(control.path().to_string()),
                test_path: Some(test.path().to_string()),
                control_value: Some(control.name().to_string()),
                test_value: Some(test.name().to_string()),
            },
            report,
        );

        match (control.kind(), test.kind()) {
            (NodeKind::Element, NodeKind::Element) => {
                self.compare_attributes(control, test, report);
                if self.report_child_count {
                    self.compare_child_count(control, test, report);
                }
            }
            (NodeKind::Text, NodeKind::Text) => self.record(
                ComparisonEntry {
                    kind: ComparisonKind::TextValue,
                    control_path: Some(control.path().to_string()),
                    test_path: Some(test.path().to_string()),
                    control_value: control.value().map(normalized),
                    test_value: test.value().map(normalized),
                },
                report,
            ),
            _ => {}
        }
    }

    fn compare_attributes(&self, control: &XmlNode, test: &XmlNode, report: &mut DiffReport) {
        for attr in control.attributes().iter().filter(|a| self.participates(a)) {
            let counterpart = test.attributes().iter().find(|a| a.name() == attr.name());
            self.record(
                ComparisonEntry {
                    kind: ComparisonKind::Attribute,
                    control_path: Some(attr.path().to_string()),
                    test_path: counterpart.map(|a| a.path().to_string()),
                    control_value: attr.value().map(normalized),
                    test_value: counterpart.and_then(XmlNode::value).map(normalized),
                },
                report,
            );
        }

        for attr in test.attributes().iter().filter(|a| self.participates(a)) {
            if control.attributes().iter().all(|a| a.name() != attr.name()) {
                self.record(
                    ComparisonEntry {
                        kind: ComparisonKind::Attribute,
                        control_path: None,
                        test_path: Some(attr.path().to_string()),
                        control_value: None,
                        test_value: attr.value().map(normalized),
                    },
                    report,
                );
            }
        }
    }

    fn compare_child_count(&self, control: &XmlNode, test: &XmlNode, report: &mut DiffReport) {
        let count = |node: &XmlNode| {
            node.children()
                .iter()
                .filter(|child| self.participates(child))
                .count()
        };
        self.record(
            ComparisonEntry {
                kind: ComparisonKind::ChildCount,
                control_path: Some(control.path().to_string()),
                test_path: Some(test.path().to_string()),
                control_value: Some(count(control).to_string()),
                test_value: Some(count(test).to_string()),
            },
            report,
        );
    }

    fn record(&self, entry: ComparisonEntry, report: &mut DiffReport) {
        let outcome = self.evaluator.evaluate(&entry, entry.raw_outcome());
        if outcome == ComparisonResult::Different {
            let difference = Difference::from_entry(entry);
            debug!(kind = %difference.kind(), path = %difference.path(), "difference");
            report.push(difference);
        }
    }
}

fn normalized(value: &str) -> String {
    normalize_whitespace(value).into_owned()
}

fn only_in_control(node: &XmlNode) -> ComparisonEntry {
    ComparisonEntry {
        kind: ComparisonKind::OnlyInControl,
        control_path: Some(node.path().to_string()),
        test_path: None,
        control_value: Some(normalized(node.display_value())),
        test_value: None,
    }
}

fn only_in_test(node: &XmlNode) -> ComparisonEntry {
    ComparisonEntry {
        kind: ComparisonKind::OnlyInTest,
        control_path: None,
        test_path: Some(node.path().to_string()),
        control_value: None,
        test_value: Some(normalized(node.display_value())),
    }
}

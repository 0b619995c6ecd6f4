//! By-name node matching among sibling candidates.

use crate::document::XmlNode;

/// Index of the first candidate not yet consumed whose name equals the
/// control node's name.
///
/// Same-named siblings are paired strictly in encounter order; there is no
/// attribute or content based disambiguation and no positional fallback.
pub fn find_match(control: &XmlNode, candidates: &[XmlNode], consumed: &[bool]) -> Option<usize> {
    candidates
        .iter()
        .zip(consumed)
        .position(|(candidate, &used)| !used && candidate.name() == control.name())
}

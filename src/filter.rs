//! Visibility filters applied on top of expansion state.

use std::collections::HashSet;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::tree::{NodeId, OutlineTree};

/// Identity of a filter, compared when deciding whether a saved view state
/// still applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterIdentity(String);

impl FilterIdentity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FilterIdentity {
    fn default() -> Self {
        AcceptAll.identity()
    }
}

impl fmt::Display for FilterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A predicate over outline nodes. A rejected node hides its whole subtree.
pub trait NodeFilter: fmt::Debug {
    fn identity(&self) -> FilterIdentity;

    /// Called before an index rebuild whenever the tree changed.
    fn prepare(&mut self, _tree: &OutlineTree) {}

    fn accepts(&self, tree: &OutlineTree, id: NodeId) -> bool;

    /// Nodes the default expansion should reveal for this filter.
    fn reveals(&self) -> Vec<NodeId> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl NodeFilter for AcceptAll {
    fn identity(&self) -> FilterIdentity {
        FilterIdentity::new("all")
    }

    fn accepts(&self, _tree: &OutlineTree, _id: NodeId) -> bool {
        true
    }
}

/// Keeps nodes whose title matches a case-insensitive pattern, plus their
/// ancestors so matches stay reachable.
#[derive(Debug, Clone)]
pub struct TitleFilter {
    pattern: Regex,
    matched: Vec<NodeId>,
    keep: HashSet<NodeId>,
}

impl TitleFilter {
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            pattern,
            matched: Vec::new(),
            keep: HashSet::new(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn match_count(&self) -> usize {
        self.matched.len()
    }
}

impl NodeFilter for TitleFilter {
    fn identity(&self) -> FilterIdentity {
        FilterIdentity::new(format!("title:{}", self.pattern.as_str()))
    }

    fn prepare(&mut self, tree: &OutlineTree) {
        let order: Vec<NodeId> = tree.pre_order().collect();
        self.matched.clear();
        self.keep.clear();
        // Children precede parents when walking pre-order backwards.
        for id in order.iter().rev() {
            let matches = tree
                .title(*id)
                .is_some_and(|title| self.pattern.is_match(title));
            if matches {
                self.matched.push(*id);
            }
            if matches || tree.children(*id).iter().any(|c| self.keep.contains(c)) {
                self.keep.insert(*id);
            }
        }
        self.matched.reverse();
        self.keep.insert(tree.root());
        tracing::debug!(
            pattern = self.pattern.as_str(),
            matched = self.matched.len(),
            kept = self.keep.len(),
            "title filter prepared"
        );
    }

    fn accepts(&self, tree: &OutlineTree, id: NodeId) -> bool {
        id == tree.root() || self.keep.contains(&id)
    }

    fn reveals(&self) -> Vec<NodeId> {
        self.matched.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::sample_tree;

    #[test]
    fn test_accept_all_identity_is_default() {
        assert_eq!(FilterIdentity::default(), AcceptAll.identity());
    }

    #[test]
    fn test_title_filter_keeps_ancestors_of_matches() {
        let tree = sample_tree();
        let mut filter = TitleFilter::new("a2").unwrap();
        filter.prepare(&tree);
        assert!(filter.accepts(&tree, NodeId(0)));
        assert!(filter.accepts(&tree, NodeId(1)));
        assert!(filter.accepts(&tree, NodeId(4)));
        assert!(!filter.accepts(&tree, NodeId(3)));
        assert!(!filter.accepts(&tree, NodeId(2)));
        assert_eq!(filter.reveals(), vec![NodeId(4)]);
    }

    #[test]
    fn test_title_filter_identity_includes_pattern() {
        let filter = TitleFilter::new("foo.*").unwrap();
        assert_eq!(filter.identity().as_str(), "title:foo.*");
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        assert!(TitleFilter::new("(").is_err());
    }
}

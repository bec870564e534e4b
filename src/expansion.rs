//! Expand/collapse operations with a minimum number of always-shown levels.

use crate::tree::{NodeId, OutlineTree, TreeError};

/// Expansion commands applied to an [`OutlineTree`].
///
/// Nodes less than `min_outline_level` below the displayed root are never
/// collapsed themselves; collapsing one collapses its children instead, so
/// the outline always shows at least that many levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionControls {
    min_outline_level: usize,
}

impl Default for ExpansionControls {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ExpansionControls {
    pub const fn new(min_outline_level: usize) -> Self {
        Self { min_outline_level }
    }

    pub const fn min_outline_level(&self) -> usize {
        self.min_outline_level
    }

    pub fn can_collapse(&self, tree: &OutlineTree, id: NodeId) -> bool {
        tree.depth_below_root(id)
            .is_some_and(|depth| depth >= self.min_outline_level)
    }

    /// Lowest level `id` may be reduced to.
    pub fn floor_level(&self, tree: &OutlineTree, id: NodeId) -> i32 {
        let depth = tree.depth_below_root(id).unwrap_or(usize::MAX);
        let floor = self.min_outline_level.saturating_sub(depth);
        i32::try_from(floor).unwrap_or(i32::MAX)
    }

    /// Show the children of a collapsed node.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown.
    pub fn expand(&self, tree: &mut OutlineTree, id: NodeId) -> Result<bool, TreeError> {
        if tree.expansion_level(id) >= 1 || !has_children(tree, id) {
            return Ok(false);
        }
        tree.expand_at_least(id, 1)?;
        Ok(true)
    }

    /// Collapse `id`, or its children when `id` sits above the minimum level.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown.
    pub fn collapse(&self, tree: &mut OutlineTree, id: NodeId) -> Result<bool, TreeError> {
        if !tree.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        if !tree.node(id).is_some_and(|node| node.is_expanded()) {
            return Ok(false);
        }
        if self.can_collapse(tree, id) {
            tree.set_expansion_level(id, 0)?;
            return Ok(true);
        }
        let mut changed = false;
        for child in tree.children(id).to_vec() {
            changed |= self.collapse(tree, child)?;
        }
        Ok(changed)
    }

    /// Show one more generation below `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown.
    pub fn expand_more(&self, tree: &mut OutlineTree, id: NodeId) -> Result<bool, TreeError> {
        if !has_children(tree, id) {
            return Ok(false);
        }
        let level = tree.expansion_level(id).max(0);
        tree.expand_at_least(id, level + 1)?;
        Ok(true)
    }

    /// Show one generation less below `id`, never below the minimum level.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown.
    pub fn reduce(&self, tree: &mut OutlineTree, id: NodeId) -> Result<bool, TreeError> {
        if !tree.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        let level = tree.expansion_level(id);
        let target = (level - 1).max(self.floor_level(tree, id)).max(0);
        if target >= level {
            return Ok(false);
        }
        tree.set_expansion_level(id, target)?;
        Ok(true)
    }

    /// Collapse if expanded and collapsible, otherwise show one more level.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown.
    pub fn toggle(&self, tree: &mut OutlineTree, id: NodeId) -> Result<bool, TreeError> {
        let expanded = tree.expansion_level(id) >= 1;
        if expanded && self.can_collapse(tree, id) {
            self.collapse(tree, id)
        } else {
            self.expand_more(tree, id)
        }
    }

    /// Make sure the displayed root shows at least the minimum number of levels.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree's root is missing.
    pub fn enforce_minimum(&self, tree: &mut OutlineTree) -> Result<(), TreeError> {
        let level = i32::try_from(self.min_outline_level).unwrap_or(i32::MAX);
        tree.expand_at_least(tree.root(), level)
    }
}

fn has_children(tree: &OutlineTree, id: NodeId) -> bool {
    !tree.children(id).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::sample_tree;

    const R: NodeId = NodeId(0);
    const A: NodeId = NodeId(1);
    const B: NodeId = NodeId(2);
    const A1: NodeId = NodeId(3);

    #[test]
    fn test_expand_shows_children() {
        let mut tree = sample_tree();
        let controls = ExpansionControls::new(0);
        assert!(controls.expand(&mut tree, R).unwrap());
        assert!(tree.is_visible(A));
        assert!(!controls.expand(&mut tree, R).unwrap());
        assert!(!controls.expand(&mut tree, B).unwrap(), "leaf");
    }

    #[test]
    fn test_collapse_below_minimum_collapses_node() {
        let mut tree = sample_tree();
        tree.expand_at_least(R, 2).unwrap();
        let controls = ExpansionControls::new(1);
        assert!(controls.collapse(&mut tree, A).unwrap());
        assert!(!tree.is_visible(A1));
        assert!(tree.is_visible(A));
    }

    #[test]
    fn test_collapse_above_minimum_recurses_into_children() {
        let mut tree = sample_tree();
        tree.expand_at_least(R, 2).unwrap();
        let controls = ExpansionControls::new(1);
        assert!(controls.collapse(&mut tree, R).unwrap());
        assert!(tree.is_visible(A), "first level stays shown");
        assert!(tree.is_visible(B));
        assert!(!tree.is_visible(A1));
        assert!(!controls.collapse(&mut tree, R).unwrap());
    }

    #[test]
    fn test_reduce_respects_floor() {
        let mut tree = sample_tree();
        tree.expand_at_least(R, 2).unwrap();
        let controls = ExpansionControls::new(1);
        assert!(controls.reduce(&mut tree, R).unwrap());
        assert_eq!(tree.expansion_level(R), 1);
        assert!(!controls.reduce(&mut tree, R).unwrap());
        assert!(tree.is_visible(A));
    }

    #[test]
    fn test_expand_more_raises_by_one() {
        let mut tree = sample_tree();
        let controls = ExpansionControls::default();
        controls.expand_more(&mut tree, R).unwrap();
        controls.expand_more(&mut tree, R).unwrap();
        assert_eq!(tree.expansion_level(R), 2);
        assert!(tree.is_visible(A1));
    }

    #[test]
    fn test_toggle() {
        let mut tree = sample_tree();
        let controls = ExpansionControls::new(1);
        controls.enforce_minimum(&mut tree).unwrap();
        assert!(controls.toggle(&mut tree, A).unwrap());
        assert!(tree.is_visible(A1));
        assert!(controls.toggle(&mut tree, A).unwrap());
        assert!(!tree.is_visible(A1));
        assert!(!controls.toggle(&mut tree, B).unwrap(), "leaf");
    }

    #[test]
    fn test_toggle_on_minimum_level_expands_more() {
        let mut tree = sample_tree();
        let controls = ExpansionControls::new(1);
        controls.enforce_minimum(&mut tree).unwrap();
        controls.toggle(&mut tree, R).unwrap();
        assert_eq!(tree.expansion_level(R), 2);
    }
}

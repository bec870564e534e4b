//! Ancestor trail pinned above the rows.
//!
//! In [`BreadcrumbMode::Anchor`] the trail is the ancestor chain of the row
//! at the top of the viewport. In [`BreadcrumbMode::FollowSelection`] it is
//! the ancestor chain of the selection, or, with the extended trail on, of a
//! deeper point of interest below the selection.
//!
//! Whatever the mode, a change in trail length changes the vertical origin of
//! every row. [`BreadcrumbUpdate::height_changed`] is the one signal callers
//! use to throw away the rendered blocks.

use serde::{Deserialize, Serialize};

use crate::tree::{NodeId, OutlineTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BreadcrumbMode {
    #[default]
    Anchor,
    FollowSelection,
}

impl BreadcrumbMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Anchor => Self::FollowSelection,
            Self::FollowSelection => Self::Anchor,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreadcrumbUpdate {
    pub changed: bool,
    pub height_changed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BreadcrumbTracker {
    mode: BreadcrumbMode,
    extended: bool,
    crumbs: Vec<NodeId>,
    point_of_interest: Option<NodeId>,
}

impl BreadcrumbTracker {
    pub fn new(mode: BreadcrumbMode, extended: bool) -> Self {
        Self {
            mode,
            extended,
            ..Self::default()
        }
    }

    pub const fn mode(&self) -> BreadcrumbMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: BreadcrumbMode) {
        self.mode = mode;
    }

    pub const fn extended(&self) -> bool {
        self.extended
    }

    pub fn set_extended(&mut self, extended: bool) {
        self.extended = extended;
    }

    pub fn crumbs(&self) -> &[NodeId] {
        &self.crumbs
    }

    pub fn len(&self) -> usize {
        self.crumbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crumbs.is_empty()
    }

    pub const fn point_of_interest(&self) -> Option<NodeId> {
        self.point_of_interest
    }

    /// Track the deepest node visited along the current branch.
    ///
    /// Selecting an ancestor of the point of interest keeps it; selecting
    /// anything else makes the new selection the point of interest.
    pub fn note_selection(&mut self, tree: &OutlineTree, node: NodeId) {
        let keep = self
            .point_of_interest
            .is_some_and(|poi| tree.contains(poi) && tree.is_ancestor(node, poi));
        if !keep {
            self.point_of_interest = Some(node);
        }
    }

    /// Drop references to removed nodes.
    pub fn forget(&mut self, removed: &[NodeId]) {
        if self
            .point_of_interest
            .is_some_and(|poi| removed.contains(&poi))
        {
            self.point_of_interest = None;
        }
        self.crumbs.retain(|crumb| !removed.contains(crumb));
    }

    /// The trail for the given state, without storing it.
    pub fn compute(
        &self,
        tree: &OutlineTree,
        anchor: Option<NodeId>,
        selection: Option<NodeId>,
    ) -> Vec<NodeId> {
        let mut crumbs = tree.detached_ancestors().to_vec();
        let target = match self.mode {
            BreadcrumbMode::Anchor => anchor,
            BreadcrumbMode::FollowSelection => match selection.filter(|s| tree.contains(*s)) {
                Some(selected) => Some(self.follow_target(tree, selected)),
                None => anchor,
            },
        };
        if let Some(target) = target.filter(|t| tree.contains(*t)) {
            crumbs.extend(tree.ancestors(target));
        }
        crumbs
    }

    /// Recompute and store the trail.
    pub fn update(
        &mut self,
        tree: &OutlineTree,
        anchor: Option<NodeId>,
        selection: Option<NodeId>,
    ) -> BreadcrumbUpdate {
        let crumbs = self.compute(tree, anchor, selection);
        let update = BreadcrumbUpdate {
            changed: crumbs != self.crumbs,
            height_changed: crumbs.len() != self.crumbs.len(),
        };
        if update.changed {
            tracing::debug!(
                mode = ?self.mode,
                len = crumbs.len(),
                height_changed = update.height_changed,
                "breadcrumb changed"
            );
            self.crumbs = crumbs;
        }
        update
    }

    fn follow_target(&self, tree: &OutlineTree, selected: NodeId) -> NodeId {
        if !self.extended {
            return selected;
        }
        self.point_of_interest
            .filter(|poi| tree.contains(*poi) && tree.is_ancestor(selected, *poi))
            .unwrap_or(selected)
    }
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
    fn test_anchor_mode_uses_anchor_ancestors() {
        let tree = sample_tree();
        let mut tracker = BreadcrumbTracker::new(BreadcrumbMode::Anchor, false);
        let update = tracker.update(&tree, Some(A1), Some(B));
        assert_eq!(tracker.crumbs(), &[R, A]);
        assert!(update.changed && update.height_changed);
    }

    #[test]
    fn test_follow_mode_uses_selection_ancestors() {
        let tree = sample_tree();
        let mut tracker = BreadcrumbTracker::new(BreadcrumbMode::FollowSelection, false);
        tracker.update(&tree, Some(B), Some(A1));
        assert_eq!(tracker.crumbs(), &[R, A]);
    }

    #[test]
    fn test_follow_mode_without_selection_falls_back_to_anchor() {
        let tree = sample_tree();
        let tracker = BreadcrumbTracker::new(BreadcrumbMode::FollowSelection, false);
        assert_eq!(tracker.compute(&tree, Some(B), None), vec![R]);
    }

    #[test]
    fn test_extended_trail_reaches_point_of_interest() {
        let tree = sample_tree();
        let mut tracker = BreadcrumbTracker::new(BreadcrumbMode::FollowSelection, true);
        tracker.note_selection(&tree, A1);
        tracker.note_selection(&tree, R);
        assert_eq!(tracker.point_of_interest(), Some(A1));
        assert_eq!(tracker.compute(&tree, None, Some(R)), vec![R, A]);

        tracker.set_extended(false);
        assert!(tracker.compute(&tree, None, Some(R)).is_empty());
    }

    #[test]
    fn test_selecting_other_branch_moves_point_of_interest() {
        let tree = sample_tree();
        let mut tracker = BreadcrumbTracker::new(BreadcrumbMode::FollowSelection, true);
        tracker.note_selection(&tree, A1);
        tracker.note_selection(&tree, B);
        assert_eq!(tracker.point_of_interest(), Some(B));
    }

    #[test]
    fn test_same_length_change_keeps_height() {
        let mut tree = sample_tree();
        tree.insert(B, NodeId(9), "B1", 0).unwrap();
        let mut tracker = BreadcrumbTracker::new(BreadcrumbMode::Anchor, false);
        tracker.update(&tree, Some(A1), None);
        let update = tracker.update(&tree, Some(NodeId(9)), None);
        assert!(update.changed);
        assert!(!update.height_changed);
        assert!(!tracker.update(&tree, Some(NodeId(9)), None).changed);
    }

    #[test]
    fn test_detached_ancestors_lead_the_trail() {
        let mut tree = OutlineTree::with_detached_ancestors(
            NodeId(10),
            "sub",
            vec![(NodeId(1), "top".into())],
        );
        tree.insert(NodeId(10), NodeId(11), "leaf", 0).unwrap();
        let tracker = BreadcrumbTracker::default();
        assert_eq!(
            tracker.compute(&tree, Some(NodeId(11)), None),
            vec![NodeId(1), NodeId(10)]
        );
    }

    #[test]
    fn test_forget_drops_removed_point_of_interest() {
        let tree = sample_tree();
        let mut tracker = BreadcrumbTracker::new(BreadcrumbMode::FollowSelection, true);
        tracker.note_selection(&tree, A1);
        tracker.forget(&[A1]);
        assert_eq!(tracker.point_of_interest(), None);
    }
}

//! Arena-backed outline tree.
//!
//! The [`OutlineTree`] holds one [`TreeNode`] wrapper per node of the
//! external document that is currently displayed. Parent and child links are
//! stored as [`NodeId`]s, so removing a node never keeps its subtree alive.
//!
//! Every node carries an expansion level:
//!
//! - `-1`: hidden (some ancestor is collapsed)
//! - `0`: visible, collapsed
//! - `n > 0`: visible, with `n` generations below it shown
//!
//! Two invariants are maintained by every mutation:
//!
//! - *hide*: a child of a node with level `<= 0` has level `-1`
//! - *floor*: a child of a node with level `L >= 1` has level `>= L - 1`
//!
//! Together they make "level >= 0" equivalent to "every ancestor has level
//! >= 1", and guarantee that an ancestor with level `L` at relative depth `d`
//! keeps the node visible whenever `L >= d`.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identity of a node, shared with the external document model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("cannot move {node} under its own descendant {target}")]
    MoveIntoDescendant { node: NodeId, target: NodeId },
    #[error("the displayed root {0} cannot be removed or moved")]
    RootImmutable(NodeId),
}

/// One wrapper node of the outline.
#[derive(Debug, Clone)]
pub struct TreeNode {
    id: NodeId,
    text: String,
    title: OnceCell<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    expansion_level: i32,
    level: i32,
    detached: bool,
}

impl TreeNode {
    fn new(id: NodeId, text: String, parent: Option<NodeId>, level: i32) -> Self {
        Self {
            id,
            text,
            title: OnceCell::new(),
            parent,
            children: Vec::new(),
            expansion_level: -1,
            level,
            detached: false,
        }
    }

    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Raw node text as reported by the document model.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Display title, computed on first access and cached until the text changes.
    pub fn title(&self) -> &str {
        self.title.get_or_init(|| display_title(&self.text))
    }

    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub const fn expansion_level(&self) -> i32 {
        self.expansion_level
    }

    /// Depth from the top of the (possibly detached) ancestor chain.
    pub const fn level(&self) -> i32 {
        self.level
    }

    pub const fn is_expanded(&self) -> bool {
        self.expansion_level >= 1
    }
}

/// First non-empty line of `text`, with runs of whitespace collapsed.
pub fn display_title(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The outline's node wrappers, addressed by id.
#[derive(Debug, Clone)]
pub struct OutlineTree {
    nodes: HashMap<NodeId, TreeNode>,
    root: NodeId,
    detached: Vec<NodeId>,
    generation: u64,
}

impl OutlineTree {
    /// Create a tree holding only `root`, collapsed.
    pub fn new(root: NodeId, text: impl Into<String>) -> Self {
        Self::with_detached_ancestors(root, text, Vec::new())
    }

    /// Create a tree whose root sits below a chain of detached ancestors.
    ///
    /// `ancestors` is ordered from the top of the chain down to the root's
    /// parent. The detached nodes are never rows of the outline; they only
    /// feed the breadcrumb. The root's level equals the chain length.
    pub fn with_detached_ancestors(
        root: NodeId,
        text: impl Into<String>,
        ancestors: Vec<(NodeId, String)>,
    ) -> Self {
        let mut nodes = HashMap::with_capacity(ancestors.len() + 1);
        let mut detached = Vec::with_capacity(ancestors.len());
        for (level, (id, text)) in ancestors.into_iter().enumerate() {
            if id == root || nodes.contains_key(&id) {
                continue;
            }
            let mut node = TreeNode::new(id, text, None, level_from(level));
            node.detached = true;
            nodes.insert(id, node);
            detached.push(id);
        }
        let mut root_node = TreeNode::new(root, text.into(), None, level_from(detached.len()));
        root_node.expansion_level = 0;
        nodes.insert(root, root_node);
        Self {
            nodes,
            root,
            detached,
            generation: 0,
        }
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Detached ancestors of the root, top first.
    pub fn detached_ancestors(&self) -> &[NodeId] {
        &self.detached
    }

    /// Bumped by every structural, text, or expansion change.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of attached nodes (detached ancestors excluded).
    pub fn len(&self) -> usize {
        self.nodes.len() - self.detached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` is an attached node of the displayed tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|node| !node.detached)
    }

    /// Look up any node, detached ancestors included.
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.attached(id).and_then(TreeNode::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.attached(id).map_or(&[], |node| node.children.as_slice())
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(TreeNode::text)
    }

    pub fn title(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(TreeNode::title)
    }

    /// Expansion level of an attached node, `-1` for unknown ids.
    pub fn expansion_level(&self, id: NodeId) -> i32 {
        self.attached(id).map_or(-1, TreeNode::expansion_level)
    }

    /// Depth below the displayed root (the root itself is `0`).
    pub fn depth_below_root(&self, id: NodeId) -> Option<usize> {
        let node = self.attached(id)?;
        let root_level = self.nodes.get(&self.root).map_or(0, TreeNode::level);
        usize::try_from(node.level - root_level).ok()
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.expansion_level(id) >= 0
    }

    /// Attached ancestors of `id`, root first, `id` excluded.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.parent(parent);
        }
        chain.reverse();
        chain
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Nodes strictly below `ancestor` down to and including `descendant`.
    pub fn path_between(&self, ancestor: NodeId, descendant: NodeId) -> Option<Vec<NodeId>> {
        let mut path = vec![descendant];
        let mut current = self.parent(descendant);
        while let Some(parent) = current {
            if parent == ancestor {
                path.reverse();
                return Some(path);
            }
            path.push(parent);
            current = self.parent(parent);
        }
        None
    }

    /// Pre-order iterator over every attached node, visible or not.
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![self.root],
        }
    }

    /// Insert a new leaf under `parent` at `index` (clamped to the child count).
    ///
    /// The new node inherits visibility from its parent: visible and collapsed
    /// (or expanded to `parent - 1`) under an expanded parent, hidden otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown or `id` already exists.
    pub fn insert(
        &mut self,
        parent: NodeId,
        id: NodeId,
        text: impl Into<String>,
        index: usize,
    ) -> Result<(), TreeError> {
        if self.nodes.contains_key(&id) {
            return Err(TreeError::DuplicateNode(id));
        }
        let parent_node = self
            .attached_mut(parent)
            .ok_or(TreeError::UnknownNode(parent))?;
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, id);
        let level = parent_node.level + 1;
        let expansion = child_level_for(parent_node.expansion_level, -1);
        let mut node = TreeNode::new(id, text.into(), Some(parent), level);
        node.expansion_level = expansion;
        self.nodes.insert(id, node);
        self.generation += 1;
        Ok(())
    }

    /// Remove `id` and its whole subtree. Returns the removed ids in pre-order.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or is the displayed root.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        if id == self.root {
            return Err(TreeError::RootImmutable(id));
        }
        let parent = self.parent_of_attached(id)?;
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|child| *child != id);
        }
        let removed = self.subtree(id);
        for node in &removed {
            self.nodes.remove(node);
        }
        self.generation += 1;
        Ok(removed)
    }

    /// Move `id` (with its subtree) under `new_parent` at `index`.
    ///
    /// Levels of the moved subtree are recomputed and the expansion
    /// invariants are re-established relative to the new parent.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown ids, the displayed root, or a move into
    /// the node's own subtree.
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        index: usize,
    ) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::RootImmutable(id));
        }
        let old_parent = self.parent_of_attached(id)?;
        if !self.contains(new_parent) {
            return Err(TreeError::UnknownNode(new_parent));
        }
        if new_parent == id || self.is_ancestor(id, new_parent) {
            return Err(TreeError::MoveIntoDescendant {
                node: id,
                target: new_parent,
            });
        }
        if let Some(parent_node) = self.nodes.get_mut(&old_parent) {
            parent_node.children.retain(|child| *child != id);
        }
        let (parent_level, parent_expansion) = {
            let parent_node = self
                .nodes
                .get_mut(&new_parent)
                .ok_or(TreeError::UnknownNode(new_parent))?;
            let index = index.min(parent_node.children.len());
            parent_node.children.insert(index, id);
            (parent_node.level, parent_node.expansion_level)
        };
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(new_parent);
            node.expansion_level = child_level_for(parent_expansion, node.expansion_level);
        }
        self.relevel(id, parent_level + 1);
        self.propagate_floor(id);
        self.generation += 1;
        Ok(())
    }

    /// Replace the text of `id`, invalidating its cached title.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::UnknownNode(id))?;
        node.text = text.into();
        node.title.take();
        self.generation += 1;
        Ok(())
    }

    /// Set the expansion level of `id` exactly.
    ///
    /// Descendants at relative depth `d` get `max(level - d, -1)`. A hidden
    /// node is revealed first, and ancestors whose level would break the
    /// floor invariant are lowered just enough. Levels below `0` are clamped.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown.
    pub fn set_expansion_level(&mut self, id: NodeId, level: i32) -> Result<(), TreeError> {
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        let level = level.max(0);
        self.reveal(id)?;
        let mut limit = level;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            limit += 1;
            let Some(parent_node) = self.nodes.get_mut(&parent) else {
                break;
            };
            if parent_node.expansion_level <= limit {
                break;
            }
            parent_node.expansion_level = limit;
            current = parent;
        }
        let mut stack = vec![(id, level)];
        while let Some((node_id, value)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(&node_id) else {
                continue;
            };
            node.expansion_level = value;
            let child_value = (value - 1).max(-1);
            stack.extend(node.children.iter().map(|child| (*child, child_value)));
        }
        self.generation += 1;
        Ok(())
    }

    /// Raise the expansion level of `id` to at least `level`.
    ///
    /// Descendants are raised to at least `level - d`; deeper expansions
    /// already present are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown.
    pub fn expand_at_least(&mut self, id: NodeId, level: i32) -> Result<(), TreeError> {
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        self.reveal(id)?;
        if let Some(node) = self.nodes.get_mut(&id)
            && node.expansion_level < level
        {
            node.expansion_level = level;
            self.propagate_floor(id);
            self.generation += 1;
        }
        Ok(())
    }

    /// Make `id` visible by expanding only its ancestor chain.
    ///
    /// Returns `true` if any level changed.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown.
    pub fn reveal(&mut self, id: NodeId) -> Result<bool, TreeError> {
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        if self.is_visible(id) {
            return Ok(false);
        }
        for ancestor in self.ancestors(id) {
            if let Some(node) = self.nodes.get_mut(&ancestor)
                && node.expansion_level < 1
            {
                node.expansion_level = 1;
                self.propagate_floor(ancestor);
            }
        }
        self.generation += 1;
        Ok(true)
    }

    /// Collapse everything except the root, which stays visible and collapsed.
    pub fn reset_expansion(&mut self) {
        let root = self.root;
        for node in self.nodes.values_mut().filter(|node| !node.detached) {
            node.expansion_level = if node.id == root { 0 } else { -1 };
        }
        self.generation += 1;
    }

    /// Overwrite a level without propagation; follow with [`Self::normalize_expansion`].
    pub(crate) fn set_raw_expansion_level(&mut self, id: NodeId, level: i32) -> bool {
        match self.attached_mut(id) {
            Some(node) => {
                node.expansion_level = level.max(-1);
                true
            }
            None => false,
        }
    }

    /// Re-establish the hide and floor invariants top-down.
    pub fn normalize_expansion(&mut self) {
        if let Some(root) = self.nodes.get_mut(&self.root) {
            root.expansion_level = root.expansion_level.max(0);
        }
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let parent_level = node.expansion_level;
            let children = node.children.clone();
            for child in children.iter().rev() {
                if let Some(child_node) = self.nodes.get_mut(child) {
                    child_node.expansion_level =
                        child_level_for(parent_level, child_node.expansion_level);
                }
                stack.push(*child);
            }
        }
        self.generation += 1;
    }

    fn attached(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id).filter(|node| !node.detached)
    }

    fn attached_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(&id).filter(|node| !node.detached)
    }

    fn parent_of_attached(&self, id: NodeId) -> Result<NodeId, TreeError> {
        self.attached(id)
            .and_then(TreeNode::parent)
            .ok_or(TreeError::UnknownNode(id))
    }

    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    fn relevel(&mut self, id: NodeId, level: i32) {
        let mut stack = vec![(id, level)];
        while let Some((node_id, value)) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.level = value;
                stack.extend(node.children.iter().map(|child| (*child, value + 1)));
            }
        }
    }

    /// Push the hide/floor constraints from `id` into its subtree, stopping
    /// wherever a child already satisfies them.
    fn propagate_floor(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            let parent_level = node.expansion_level;
            let children = node.children.clone();
            for child in children {
                let Some(child_node) = self.nodes.get_mut(&child) else {
                    continue;
                };
                let next = child_level_for(parent_level, child_node.expansion_level);
                if next != child_node.expansion_level {
                    child_node.expansion_level = next;
                    stack.push(child);
                }
            }
        }
    }
}

/// Level a child must have under a parent at `parent_level`, given its current level.
const fn child_level_for(parent_level: i32, current: i32) -> i32 {
    if parent_level <= 0 {
        -1
    } else if current < parent_level - 1 {
        parent_level - 1
    } else {
        current
    }
}

fn level_from(depth: usize) -> i32 {
    i32::try_from(depth).unwrap_or(i32::MAX)
}

/// Pre-order traversal of the attached nodes.
pub struct PreOrder<'a> {
    tree: &'a OutlineTree,
    stack: Vec<NodeId>,
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    /// R -> [A -> [A1, A2], B]
    pub(crate) fn sample_tree() -> OutlineTree {
        let mut tree = OutlineTree::new(NodeId(0), "R");
        tree.insert(NodeId(0), NodeId(1), "A", 0).unwrap();
        tree.insert(NodeId(0), NodeId(2), "B", 1).unwrap();
        tree.insert(NodeId(1), NodeId(3), "A1", 0).unwrap();
        tree.insert(NodeId(1), NodeId(4), "A2", 1).unwrap();
        tree
    }

    fn assert_invariants(tree: &OutlineTree) {
        for id in tree.pre_order() {
            let level = tree.expansion_level(id);
            for child in tree.children(id) {
                let child_level = tree.expansion_level(*child);
                if level <= 0 {
                    assert_eq!(child_level, -1, "child {child} of collapsed {id} is not hidden");
                } else {
                    assert!(child_level >= level - 1, "child {child} breaks floor under {id}");
                }
            }
        }
    }

    #[test]
    fn test_new_tree_has_visible_collapsed_root() {
        let tree = OutlineTree::new(NodeId(7), "root");
        assert_eq!(tree.expansion_level(NodeId(7)), 0);
        assert!(tree.is_visible(NodeId(7)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_insert_under_collapsed_parent_is_hidden() {
        let tree = sample_tree();
        assert_eq!(tree.expansion_level(NodeId(1)), -1);
        assert!(!tree.is_visible(NodeId(3)));
    }

    #[test]
    fn test_insert_clamps_index_and_sets_level() {
        let mut tree = sample_tree();
        tree.insert(NodeId(0), NodeId(9), "Z", 99).unwrap();
        assert_eq!(tree.children(NodeId(0)), &[NodeId(1), NodeId(2), NodeId(9)]);
        assert_eq!(tree.node(NodeId(9)).unwrap().level(), 1);
    }

    #[test]
    fn test_insert_duplicate_is_error() {
        let mut tree = sample_tree();
        let err = tree.insert(NodeId(0), NodeId(1), "dup", 0).unwrap_err();
        assert_eq!(err, TreeError::DuplicateNode(NodeId(1)));
    }

    #[test]
    fn test_title_is_first_line_collapsed() {
        let mut tree = OutlineTree::new(NodeId(0), "\n  Hello    world \nbody");
        assert_eq!(tree.title(NodeId(0)), Some("Hello world"));
        tree.set_text(NodeId(0), "Changed").unwrap();
        assert_eq!(tree.title(NodeId(0)), Some("Changed"));
    }

    #[test]
    fn test_expand_at_least_shows_children_collapsed() {
        let mut tree = sample_tree();
        tree.expand_at_least(NodeId(0), 1).unwrap();
        assert_eq!(tree.expansion_level(NodeId(1)), 0);
        assert_eq!(tree.expansion_level(NodeId(2)), 0);
        assert_eq!(tree.expansion_level(NodeId(3)), -1);
        assert_invariants(&tree);
    }

    #[test]
    fn test_collapse_to_zero_hides_descendants_without_removing() {
        let mut tree = sample_tree();
        tree.expand_at_least(NodeId(0), 2).unwrap();
        assert!(tree.is_visible(NodeId(3)));
        tree.set_expansion_level(NodeId(1), 0).unwrap();
        assert!(!tree.is_visible(NodeId(3)));
        assert!(tree.contains(NodeId(3)));
        assert_eq!(tree.expansion_level(NodeId(0)), 1, "root lowered to keep floor");
        assert_invariants(&tree);
    }

    #[test]
    fn test_reveal_expands_only_ancestor_chain() {
        let mut tree = sample_tree();
        tree.insert(NodeId(2), NodeId(5), "B1", 0).unwrap();
        assert!(tree.reveal(NodeId(3)).unwrap());
        assert!(tree.is_visible(NodeId(3)));
        assert!(tree.is_visible(NodeId(2)));
        assert!(!tree.is_visible(NodeId(5)), "sibling branch stays collapsed");
        assert!(!tree.reveal(NodeId(3)).unwrap());
        assert_invariants(&tree);
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut tree = sample_tree();
        let removed = tree.remove(NodeId(1)).unwrap();
        assert_eq!(removed, vec![NodeId(1), NodeId(3), NodeId(4)]);
        assert!(!tree.contains(NodeId(3)));
        assert_eq!(tree.children(NodeId(0)), &[NodeId(2)]);
    }

    #[test]
    fn test_remove_root_is_error() {
        let mut tree = sample_tree();
        assert_eq!(
            tree.remove(NodeId(0)).unwrap_err(),
            TreeError::RootImmutable(NodeId(0))
        );
    }

    #[test]
    fn test_move_recomputes_levels_and_visibility() {
        let mut tree = sample_tree();
        tree.expand_at_least(NodeId(0), 1).unwrap();
        tree.move_node(NodeId(2), NodeId(1), 0).unwrap();
        assert_eq!(tree.children(NodeId(1)), &[NodeId(2), NodeId(3), NodeId(4)]);
        assert_eq!(tree.node(NodeId(2)).unwrap().level(), 2);
        assert!(!tree.is_visible(NodeId(2)), "moved under a collapsed parent");
        assert_invariants(&tree);
    }

    #[test]
    fn test_move_into_own_subtree_is_error() {
        let mut tree = sample_tree();
        let err = tree.move_node(NodeId(1), NodeId(3), 0).unwrap_err();
        assert!(matches!(err, TreeError::MoveIntoDescendant { .. }));
    }

    #[test]
    fn test_detached_ancestors_set_root_level() {
        let tree = OutlineTree::with_detached_ancestors(
            NodeId(10),
            "sub",
            vec![(NodeId(1), "top".into()), (NodeId(2), "mid".into())],
        );
        assert_eq!(tree.node(NodeId(10)).unwrap().level(), 2);
        assert_eq!(tree.detached_ancestors(), &[NodeId(1), NodeId(2)]);
        assert!(!tree.contains(NodeId(1)));
        assert_eq!(tree.title(NodeId(2)), Some("mid"));
        assert_eq!(tree.depth_below_root(NodeId(10)), Some(0));
    }

    #[test]
    fn test_path_between() {
        let tree = sample_tree();
        assert_eq!(
            tree.path_between(NodeId(0), NodeId(3)),
            Some(vec![NodeId(1), NodeId(3)])
        );
        assert_eq!(tree.path_between(NodeId(2), NodeId(3)), None);
    }

    #[test]
    fn test_normalize_repairs_raw_levels() {
        let mut tree = sample_tree();
        tree.set_raw_expansion_level(NodeId(3), 4);
        tree.normalize_expansion();
        assert_eq!(tree.expansion_level(NodeId(3)), -1);
        assert_invariants(&tree);
    }

    /// Build a random tree from parent picks: node `i + 1` hangs under `picks[i] % (i + 1)`.
    pub(crate) fn tree_from_picks(picks: &[usize]) -> OutlineTree {
        let mut tree = OutlineTree::new(NodeId(0), "n0");
        for (i, pick) in picks.iter().enumerate() {
            let parent = NodeId((pick % (i + 1)) as u64);
            let id = NodeId(i as u64 + 1);
            tree.insert(parent, id, format!("n{}", id.0), usize::MAX).unwrap();
        }
        tree
    }

    proptest! {
        #[test]
        fn expansion_ops_keep_invariants(
            picks in prop::collection::vec(0usize..1000, 1..60),
            ops in prop::collection::vec((0usize..1000, 0i32..4, any::<bool>()), 0..40),
        ) {
            let mut tree = tree_from_picks(&picks);
            let count = tree.len();
            for (target, level, exact) in ops {
                let id = NodeId((target % count) as u64);
                if exact {
                    tree.set_expansion_level(id, level).unwrap();
                } else {
                    tree.expand_at_least(id, level).unwrap();
                }
                assert_invariants(&tree);
            }
        }

        #[test]
        fn visible_iff_all_ancestors_expanded(
            picks in prop::collection::vec(0usize..1000, 1..60),
            ops in prop::collection::vec((0usize..1000, 0i32..4), 0..30),
        ) {
            let mut tree = tree_from_picks(&picks);
            let count = tree.len();
            for (target, level) in ops {
                tree.set_expansion_level(NodeId((target % count) as u64), level).unwrap();
            }
            for id in tree.pre_order() {
                let ancestors = tree.ancestors(id);
                let all_expanded = ancestors.iter().all(|a| tree.expansion_level(*a) >= 1);
                prop_assert_eq!(tree.is_visible(id), all_expanded);
                // Any ancestor whose level reaches this node keeps it visible.
                let depth = ancestors.len();
                for (i, a) in ancestors.iter().enumerate() {
                    let relative = (depth - i) as i32;
                    if tree.expansion_level(*a) >= relative {
                        prop_assert!(tree.is_visible(id));
                    }
                }
            }
        }
    }
}

//! The external document model seen by the outline.
//!
//! The outline never owns the document. It reads structure and text through
//! [`TreeSource`] and is told about changes with [`TreeEvent`]s.
//! [`MemoryTree`] is a small in-memory model used by the terminal front end,
//! the tests, and the benches.

use std::collections::HashMap;

use thiserror::Error;

use crate::tree::NodeId;

/// Read access to an external tree.
pub trait TreeSource {
    fn root(&self) -> NodeId;
    fn parent(&self, id: NodeId) -> Option<NodeId>;
    fn children(&self, id: NodeId) -> &[NodeId];
    fn text(&self, id: NodeId) -> Option<&str>;

    fn contains(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }
}

/// Structural and content changes reported by the document model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    Inserted {
        parent: NodeId,
        child: NodeId,
        index: usize,
    },
    Removed {
        parent: NodeId,
        child: NodeId,
    },
    Moved {
        old_parent: NodeId,
        new_parent: NodeId,
        child: NodeId,
    },
    Changed {
        node: NodeId,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("the root node cannot be removed or moved")]
    Root,
    #[error("cannot move {0} into its own subtree")]
    Cycle(NodeId),
}

#[derive(Debug, Clone)]
struct MemoryNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    text: String,
}

/// An in-memory document tree whose mutations return the matching event.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    nodes: HashMap<NodeId, MemoryNode>,
    root: NodeId,
    next_id: u64,
}

impl MemoryTree {
    pub fn new(root_text: impl Into<String>) -> Self {
        Self::with_root(NodeId(0), root_text)
    }

    pub fn with_root(root: NodeId, root_text: impl Into<String>) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            MemoryNode {
                parent: None,
                children: Vec::new(),
                text: root_text.into(),
            },
        );
        Self {
            nodes,
            root,
            next_id: root.0.wrapping_add(1),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a child with a freshly allocated id.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown.
    pub fn add(
        &mut self,
        parent: NodeId,
        text: impl Into<String>,
    ) -> Result<(NodeId, TreeEvent), SourceError> {
        let mut id = NodeId(self.next_id);
        while self.nodes.contains_key(&id) {
            id = NodeId(id.0.wrapping_add(1));
        }
        let event = self.insert_with_id(parent, id, text, usize::MAX)?;
        Ok((id, event))
    }

    /// Insert a child with a caller-chosen id at `index` (clamped).
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown or `id` is taken.
    pub fn insert_with_id(
        &mut self,
        parent: NodeId,
        id: NodeId,
        text: impl Into<String>,
        index: usize,
    ) -> Result<TreeEvent, SourceError> {
        if self.nodes.contains_key(&id) {
            return Err(SourceError::DuplicateNode(id));
        }
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(SourceError::UnknownNode(parent))?;
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, id);
        self.nodes.insert(
            id,
            MemoryNode {
                parent: Some(parent),
                children: Vec::new(),
                text: text.into(),
            },
        );
        self.next_id = self.next_id.max(id.0.wrapping_add(1));
        Ok(TreeEvent::Inserted {
            parent,
            child: id,
            index,
        })
    }

    /// Remove `id` and its subtree.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or is the root.
    pub fn remove(&mut self, id: NodeId) -> Result<TreeEvent, SourceError> {
        if id == self.root {
            return Err(SourceError::Root);
        }
        let parent = self
            .nodes
            .get(&id)
            .and_then(|node| node.parent)
            .ok_or(SourceError::UnknownNode(id))?;
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|child| *child != id);
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
        }
        Ok(TreeEvent::Removed { parent, child: id })
    }

    /// Move `id` under `new_parent` at `index` (clamped).
    ///
    /// # Errors
    ///
    /// Returns an error for unknown ids, the root, or a move into the node's own subtree.
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        index: usize,
    ) -> Result<TreeEvent, SourceError> {
        if id == self.root {
            return Err(SourceError::Root);
        }
        if !self.nodes.contains_key(&new_parent) {
            return Err(SourceError::UnknownNode(new_parent));
        }
        let mut cursor = Some(new_parent);
        while let Some(current) = cursor {
            if current == id {
                return Err(SourceError::Cycle(id));
            }
            cursor = self.parent(current);
        }
        let old_parent = self
            .nodes
            .get(&id)
            .and_then(|node| node.parent)
            .ok_or(SourceError::UnknownNode(id))?;
        if let Some(parent_node) = self.nodes.get_mut(&old_parent) {
            parent_node.children.retain(|child| *child != id);
        }
        if let Some(parent_node) = self.nodes.get_mut(&new_parent) {
            let index = index.min(parent_node.children.len());
            parent_node.children.insert(index, id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(new_parent);
        }
        Ok(TreeEvent::Moved {
            old_parent,
            new_parent,
            child: id,
        })
    }

    /// Replace the text of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown.
    pub fn set_text(
        &mut self,
        id: NodeId,
        text: impl Into<String>,
    ) -> Result<TreeEvent, SourceError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(SourceError::UnknownNode(id))?;
        node.text = text.into();
        Ok(TreeEvent::Changed { node: id })
    }

    /// Every node in pre-order.
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }
}

impl TreeSource for MemoryTree {
    fn root(&self) -> NodeId {
        self.root
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map_or(&[], |node| node.children.as_slice())
    }

    fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(|node| node.text.as_str())
    }
}

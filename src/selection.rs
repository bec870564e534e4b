//! The single current selection and the per-branch history behind it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tree::{NodeId, OutlineTree};

/// Where a selection change came from.
///
/// External changes arrive from the paired document view and must not be
/// pushed back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionTrigger {
    Internal,
    External,
}

impl SelectionTrigger {
    /// Whether the host should hear about a change with this trigger.
    pub const fn notifies_host(self) -> bool {
        matches!(self, Self::Internal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The node was already selected.
    Unchanged,
    Changed { previous: Option<NodeId> },
}

impl SelectOutcome {
    pub const fn is_changed(self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selected: Option<NodeId>,
    preferred_children: HashMap<NodeId, NodeId>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected == Some(id)
    }

    /// Select `id`, remembering it as the preferred child of its parent.
    pub fn set(&mut self, tree: &OutlineTree, id: NodeId) -> SelectOutcome {
        if self.selected == Some(id) {
            return SelectOutcome::Unchanged;
        }
        if let Some(parent) = tree.parent(id) {
            self.preferred_children.insert(parent, id);
        }
        let previous = self.selected.replace(id);
        SelectOutcome::Changed { previous }
    }

    pub fn clear(&mut self) -> Option<NodeId> {
        self.selected.take()
    }

    /// The last selected child of `parent`, if it is still one of its children.
    pub fn preferred_child(&self, tree: &OutlineTree, parent: NodeId) -> Option<NodeId> {
        self.preferred_children
            .get(&parent)
            .copied()
            .filter(|child| tree.parent(*child) == Some(parent))
    }

    /// Drop history and selection entries for removed nodes.
    ///
    /// Returns `true` if the selection itself was removed.
    pub fn forget(&mut self, removed: &[NodeId]) -> bool {
        self.preferred_children
            .retain(|parent, child| !removed.contains(parent) && !removed.contains(child));
        if self.selected.is_some_and(|id| removed.contains(&id)) {
            self.selected = None;
            return true;
        }
        false
    }

    /// Nearest node that should carry the selection when `id` is no longer
    /// usable: `id` itself if visible in `is_shown`, else its nearest shown
    /// ancestor, else the root.
    pub fn fallback_for(
        tree: &OutlineTree,
        id: NodeId,
        is_shown: impl Fn(NodeId) -> bool,
    ) -> NodeId {
        if tree.contains(id) && is_shown(id) {
            return id;
        }
        tree.ancestors(id)
            .into_iter()
            .rev()
            .find(|ancestor| is_shown(*ancestor))
            .unwrap_or_else(|| tree.root())
    }
}

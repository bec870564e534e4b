//! Flattened, expansion-aware list of visible nodes.

use std::collections::HashMap;

use crate::filter::NodeFilter;
use crate::tree::{NodeId, OutlineTree};

/// The visible nodes of an [`OutlineTree`] in document order.
///
/// Always rebuilt as a whole; a node missing from the index is not visible.
#[derive(Debug, Clone, Default)]
pub struct VisibleNodeIndex {
    nodes: Vec<NodeId>,
    positions: HashMap<NodeId, usize>,
    generation: u64,
    tree_generation: Option<u64>,
}

impl VisibleNodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from `tree`, descending only into expanded nodes the filter accepts.
    pub fn rebuild(&mut self, tree: &OutlineTree, filter: &dyn NodeFilter) {
        let _scope = crate::perf::scope("index.rebuild");
        self.nodes.clear();
        self.positions.clear();
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            let Some(node) = tree.node(id) else {
                continue;
            };
            if node.expansion_level() < 0 || !filter.accepts(tree, id) {
                continue;
            }
            self.positions.insert(id, self.nodes.len());
            self.nodes.push(id);
            if node.is_expanded() {
                stack.extend(node.children().iter().rev().copied());
            }
        }
        self.generation += 1;
        self.tree_generation = Some(tree.generation());
        tracing::debug!(
            visible = self.nodes.len(),
            generation = self.generation,
            "visible index rebuilt"
        );
    }

    /// Whether the index was built from the tree's current generation.
    pub fn is_current(&self, tree: &OutlineTree) -> bool {
        self.tree_generation == Some(tree.generation())
    }

    /// Bumped on every rebuild.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn node_at(&self, index: usize) -> Option<NodeId> {
        self.nodes.get(index).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }
}

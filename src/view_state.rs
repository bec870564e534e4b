//! Serializable snapshot of the outline's user-visible state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::FilterIdentity;
use crate::tree::{NodeId, OutlineTree};

#[derive(Debug, Error)]
pub enum ViewStateError {
    #[error("failed to access view state {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid view state {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Expansion levels, scroll anchor and selection of one (root, filter) context.
///
/// Only applies to the context it was captured from; see [`ViewState::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub root_node: NodeId,
    pub filter_identity: FilterIdentity,
    pub first_visible_node: Option<NodeId>,
    pub expansion_levels: BTreeMap<NodeId, i32>,
    #[serde(default)]
    pub selected_node: Option<NodeId>,
}

impl ViewState {
    /// Snapshot the levels of every visible node of `tree`.
    pub fn capture(
        tree: &OutlineTree,
        filter_identity: FilterIdentity,
        first_visible_node: Option<NodeId>,
        selected_node: Option<NodeId>,
    ) -> Self {
        let expansion_levels = tree
            .pre_order()
            .map(|id| (id, tree.expansion_level(id)))
            .filter(|(_, level)| *level >= 0)
            .collect();
        Self {
            root_node: tree.root(),
            filter_identity,
            first_visible_node,
            expansion_levels,
            selected_node,
        }
    }

    pub fn matches(&self, root: NodeId, filter_identity: &FilterIdentity) -> bool {
        self.root_node == root && &self.filter_identity == filter_identity
    }

    /// Replace the expansion state of `tree` with the captured levels.
    ///
    /// Ids missing from the tree are skipped. Returns how many levels applied.
    pub fn apply_levels(&self, tree: &mut OutlineTree) -> usize {
        tree.reset_expansion();
        let mut applied = 0;
        for (id, level) in &self.expansion_levels {
            if tree.set_raw_expansion_level(*id, *level) {
                applied += 1;
            } else {
                tracing::debug!(node = %id, "skipping stale view state entry");
            }
        }
        tree.normalize_expansion();
        applied
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ViewStateError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ViewStateError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ViewStateError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| ViewStateError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ViewStateError> {
        let content = fs::read_to_string(path).map_err(|source| ViewStateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ViewStateError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::sample_tree;
    use tempfile::TempDir;

    #[test]
    fn test_capture_records_visible_levels() {
        let mut tree = sample_tree();
        tree.expand_at_least(NodeId(0), 1).unwrap();
        let state = ViewState::capture(&tree, FilterIdentity::default(), Some(NodeId(1)), None);
        assert_eq!(
            state.expansion_levels,
            BTreeMap::from([(NodeId(0), 1), (NodeId(1), 0), (NodeId(2), 0)])
        );
    }

    #[test]
    fn test_apply_reproduces_levels() {
        let mut tree = sample_tree();
        tree.expand_at_least(NodeId(0), 1).unwrap();
        tree.expand_at_least(NodeId(1), 1).unwrap();
        let state = ViewState::capture(&tree, FilterIdentity::default(), None, None);
        let before: Vec<i32> = tree.pre_order().map(|id| tree.expansion_level(id)).collect();

        tree.reset_expansion();
        assert_eq!(state.apply_levels(&mut tree), 5);
        let after: Vec<i32> = tree.pre_order().map(|id| tree.expansion_level(id)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_apply_skips_stale_ids() {
        let mut tree = sample_tree();
        let mut state = ViewState::capture(&tree, FilterIdentity::default(), None, None);
        state.expansion_levels.insert(NodeId(99), 3);
        state.expansion_levels.insert(NodeId(0), 1);
        assert_eq!(state.apply_levels(&mut tree), 1);
        assert!(tree.is_visible(NodeId(1)));
    }

    #[test]
    fn test_matches_requires_root_and_filter() {
        let tree = sample_tree();
        let state = ViewState::capture(&tree, FilterIdentity::default(), None, None);
        assert!(state.matches(NodeId(0), &FilterIdentity::default()));
        assert!(!state.matches(NodeId(1), &FilterIdentity::default()));
        assert!(!state.matches(NodeId(0), &FilterIdentity::new("title:x")));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let tree = sample_tree();
        let state = ViewState::capture(&tree, FilterIdentity::default(), Some(NodeId(0)), Some(NodeId(0)));
        state.save(&path).unwrap();
        assert_eq!(ViewState::load(&path).unwrap(), state);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            ViewState::load(&path),
            Err(ViewStateError::Json { .. })
        ));
    }
}

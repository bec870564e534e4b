//! Logical focus tracking across re-renders.
//!
//! Row widgets may be destroyed and recreated by a rebuild. Focus is
//! therefore tracked as a node id: [`FocusManager::capture`] runs before the
//! rebuild, [`FocusManager::restore`] after layout, when the new rows exist.

use crate::tree::NodeId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusManager {
    focused: Option<NodeId>,
    captured: bool,
}

impl FocusManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node whose row currently holds focus, if focus is inside the outline.
    pub const fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Record focus moving to `node`'s row (or out of the outline with `None`).
    pub fn set_focused(&mut self, node: Option<NodeId>) {
        self.focused = node;
    }

    /// Remember whether focus was inside the outline before a rebuild.
    pub fn capture(&mut self, focus_in_outline: bool) {
        self.captured = focus_in_outline;
    }

    pub const fn is_captured(&self) -> bool {
        self.captured
    }

    /// After layout: the node to focus, if focus was captured and its row exists.
    pub fn restore(
        &mut self,
        selected: Option<NodeId>,
        row_exists: impl Fn(NodeId) -> bool,
    ) -> Option<NodeId> {
        if !std::mem::take(&mut self.captured) {
            return None;
        }
        let target = selected.filter(|node| row_exists(*node))?;
        self.focused = Some(target);
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_without_capture_leaves_focus() {
        let mut focus = FocusManager::new();
        focus.capture(false);
        assert_eq!(focus.restore(Some(NodeId(1)), |_| true), None);
        assert_eq!(focus.focused(), None);
    }

    #[test]
    fn test_restore_focuses_recreated_selection() {
        let mut focus = FocusManager::new();
        focus.set_focused(Some(NodeId(1)));
        focus.capture(true);
        assert_eq!(focus.restore(Some(NodeId(2)), |_| true), Some(NodeId(2)));
        assert_eq!(focus.focused(), Some(NodeId(2)));
        assert!(!focus.is_captured());
    }

    #[test]
    fn test_restore_skips_missing_rows() {
        let mut focus = FocusManager::new();
        focus.capture(true);
        assert_eq!(focus.restore(Some(NodeId(2)), |_| false), None);
        assert!(!focus.is_captured(), "a capture is consumed by one restore");
    }
}

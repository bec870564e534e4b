//! Callbacks the outline raises towards its host.

use crate::filter::FilterIdentity;
use crate::selection::SelectionTrigger;
use crate::tree::NodeId;

/// Registered once on an [`Outline`](crate::outline::Outline).
///
/// `selection_changed` only fires for [`SelectionTrigger::Internal`]
/// changes; the trigger is passed along so hosts can assert on it.
pub trait OutlineListener {
    fn selection_changed(&mut self, _node: NodeId, _trigger: SelectionTrigger) {}

    fn structure_changed(&mut self) {}

    fn filter_changed(&mut self, _identity: &FilterIdentity) {}
}

/// Listener that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl OutlineListener for NoopListener {}

/// Listener that queues notifications for a host to drain on its own schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueuedListener {
    pub selections: Vec<(NodeId, SelectionTrigger)>,
    pub structure_changes: usize,
    pub filters: Vec<FilterIdentity>,
}

impl QueuedListener {
    pub fn take_selections(&mut self) -> Vec<(NodeId, SelectionTrigger)> {
        std::mem::take(&mut self.selections)
    }
}

impl OutlineListener for QueuedListener {
    fn selection_changed(&mut self, node: NodeId, trigger: SelectionTrigger) {
        self.selections.push((node, trigger));
    }

    fn structure_changed(&mut self) {
        self.structure_changes += 1;
    }

    fn filter_changed(&mut self, identity: &FilterIdentity) {
        self.filters.push(identity.clone());
    }
}

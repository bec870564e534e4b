//! Keyboard navigation over the visible rows.
//!
//! [`plan`] turns a [`Direction`] into a [`NavAction`] from a read-only view
//! of the outline; the [`Outline`](crate::outline::Outline) applies it.
//! Every action that moves the selection carries the scroll offset that
//! keeps the new selection fully visible, computed against the breadcrumb
//! the move will produce.

use crate::breadcrumb::{BreadcrumbMode, BreadcrumbTracker};
use crate::expansion::ExpansionControls;
use crate::geometry::Geometry;
use crate::index::VisibleNodeIndex;
use crate::selection::SelectionController;
use crate::tree::{NodeId, OutlineTree};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    PageUp,
    PageDown,
    /// Collapse, or go to the parent.
    Left,
    /// Expand, or go to a child.
    Right,
    Home,
    End,
}

impl Direction {
    /// Swap `Left` and `Right` for right-to-left layouts.
    #[must_use]
    pub const fn mirrored(self, rtl: bool) -> Self {
        match (self, rtl) {
            (Self::Left, true) => Self::Right,
            (Self::Right, true) => Self::Left,
            (direction, _) => direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    None,
    /// Select `node`, scrolling to `scroll` first when set.
    Select { node: NodeId, scroll: Option<u64> },
    /// Collapse `node` (or its children above the minimum level); selection stays.
    Collapse(NodeId),
    /// Expand `node`, then select its `child`.
    ExpandAndSelect { node: NodeId, child: NodeId },
}

/// Read-only view of the outline state navigation depends on.
#[derive(Debug, Clone, Copy)]
pub struct NavContext<'a> {
    pub tree: &'a OutlineTree,
    pub index: &'a VisibleNodeIndex,
    pub viewport: &'a Viewport,
    pub geometry: &'a Geometry,
    pub breadcrumb: &'a BreadcrumbTracker,
    pub selection: &'a SelectionController,
    pub expansion: &'a ExpansionControls,
}

/// Decide what `direction` does in `ctx`. Without a selection, or with no
/// visible rows, nothing happens.
pub fn plan(ctx: &NavContext<'_>, direction: Direction) -> NavAction {
    let Some(selected) = ctx.selection.selected() else {
        return NavAction::None;
    };
    if ctx.index.is_empty() {
        return NavAction::None;
    }
    let Some(current) = ctx.index.index_of(selected) else {
        return NavAction::None;
    };
    let last = ctx.index.len() - 1;
    let target = match direction.mirrored(ctx.geometry.is_rtl()) {
        Direction::Up => current.checked_sub(1),
        Direction::Down => (current < last).then_some(current + 1),
        Direction::Home => Some(0),
        Direction::End => Some(last),
        Direction::PageUp => Some(page_up_target(ctx, current)),
        Direction::PageDown => Some(page_down_target(ctx, current, last)),
        Direction::Left => return plan_left(ctx, selected),
        Direction::Right => return plan_right(ctx, selected),
    };
    match target {
        Some(target) if target != current => select_index(ctx, target),
        _ => NavAction::None,
    }
}

/// First press moves to the top boundary of the window, the next one pages.
fn page_up_target(ctx: &NavContext<'_>, current: usize) -> usize {
    match ctx.viewport.first_fully_visible_row() {
        Some(boundary) if current > boundary => boundary,
        _ => current.saturating_sub(ctx.viewport.rows_per_page()),
    }
}

fn page_down_target(ctx: &NavContext<'_>, current: usize, last: usize) -> usize {
    match ctx.viewport.last_fully_visible_row() {
        Some(boundary) if current < boundary => boundary,
        _ => (current + ctx.viewport.rows_per_page()).min(last),
    }
}

fn plan_left(ctx: &NavContext<'_>, selected: NodeId) -> NavAction {
    let expanded = ctx.tree.node(selected).is_some_and(|node| node.is_expanded());
    let collapsible = ctx.expansion.can_collapse(ctx.tree, selected)
        || ctx
            .tree
            .children(selected)
            .iter()
            .any(|child| ctx.tree.expansion_level(*child) >= 1);
    if expanded && collapsible && ctx.tree.node(selected).is_some_and(|n| n.has_children()) {
        return NavAction::Collapse(selected);
    }
    ctx.tree
        .parent(selected)
        .and_then(|parent| ctx.index.index_of(parent))
        .map_or(NavAction::None, |index| select_index(ctx, index))
}

fn plan_right(ctx: &NavContext<'_>, selected: NodeId) -> NavAction {
    let children = ctx.tree.children(selected);
    let Some(first) = children.first().copied() else {
        return NavAction::None;
    };
    let child = ctx
        .selection
        .preferred_child(ctx.tree, selected)
        .unwrap_or(first);
    match ctx.index.index_of(child) {
        Some(index) => select_index(ctx, index),
        None => NavAction::ExpandAndSelect {
            node: selected,
            child,
        },
    }
}

fn select_index(ctx: &NavContext<'_>, index: usize) -> NavAction {
    match ctx.index.node_at(index) {
        Some(node) => NavAction::Select {
            node,
            scroll: scroll_to_reveal(ctx, index),
        },
        None => NavAction::None,
    }
}

/// Scroll offset that makes row `index` fully visible once it is selected,
/// or `None` if it already will be.
///
/// The breadcrumb height depends on where the move lands: in follow mode on
/// the new selection, in anchor mode on the row the scroll brings to the
/// top, which in turn depends on the breadcrumb height. The anchor case is
/// iterated until the height settles.
pub fn scroll_to_reveal(ctx: &NavContext<'_>, index: usize) -> Option<u64> {
    let node = ctx.index.node_at(index)?;
    let current = ctx.viewport.scroll_offset();
    match ctx.breadcrumb.mode() {
        BreadcrumbMode::FollowSelection => {
            let mut tracker = ctx.breadcrumb.clone();
            tracker.note_selection(ctx.tree, node);
            let crumbs = tracker.compute(ctx.tree, None, Some(node));
            let viewport = ctx
                .viewport
                .with_breadcrumb_height(ctx.geometry.breadcrumb_height(crumbs.len()));
            viewport.offset_to_reveal(index)
        }
        BreadcrumbMode::Anchor => {
            let mut height = ctx.viewport.breadcrumb_height();
            let mut offset = current;
            for _ in 0..4 {
                let mut viewport = ctx.viewport.with_breadcrumb_height(height);
                offset = viewport.offset_to_reveal(index).unwrap_or(current);
                viewport.scroll_to(offset);
                let anchor = viewport
                    .first_visible_row()
                    .and_then(|row| ctx.index.node_at(row));
                let crumbs = ctx.breadcrumb.compute(ctx.tree, anchor, Some(node));
                let next = ctx.geometry.breadcrumb_height(crumbs.len());
                if next == height {
                    break;
                }
                height = next;
            }
            (offset != current).then_some(offset)
        }
    }
}

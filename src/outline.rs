//! The outline view: wrapper tree, visible index, windowed rows, breadcrumb
//! and selection, kept consistent by one recompute pipeline.
//!
//! ```text
//! tree change ─> index rebuild ─> breadcrumb ─> block diff ─> focus restore
//! ```
//!
//! Every public action mutates the wrapper tree or the selection and then
//! runs [`Outline::refresh`]. Scrolling is the exception: it repositions rows
//! right away and leaves the breadcrumb to [`Outline::tick`] once scrolling
//! has settled.

use std::collections::HashMap;

use unicode_width::UnicodeWidthStr;

use crate::blocks::{BlockRenderer, Expander, RenderOutcome, RowFactory, RowModel, RowSource};
use crate::breadcrumb::{BreadcrumbMode, BreadcrumbTracker};
use crate::debounce::ScrollDebouncer;
use crate::expansion::ExpansionControls;
use crate::filter::{AcceptAll, FilterIdentity, NodeFilter};
use crate::focus::FocusManager;
use crate::geometry::{Geometry, GeometryConfig};
use crate::index::VisibleNodeIndex;
use crate::listener::{NoopListener, OutlineListener};
use crate::navigation::{self, Direction, NavAction, NavContext};
use crate::selection::{SelectionController, SelectionTrigger};
use crate::source::{TreeEvent, TreeSource};
use crate::tree::{NodeId, OutlineTree, TreeError};
use crate::view_state::ViewState;
use crate::viewport::{DEFAULT_BLOCK_SIZE, Viewport};

/// Behavioural settings of an [`Outline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineConfig {
    /// Rows per rendered block.
    pub block_size: usize,
    /// Levels below the displayed root that are always shown.
    pub min_outline_level: usize,
    /// Expansion level of the displayed root when no saved state applies.
    pub initial_expansion_level: i32,
    pub breadcrumb_mode: BreadcrumbMode,
    pub extended_breadcrumb: bool,
    /// Quiet period after the last scroll before the breadcrumb is recomputed.
    pub scroll_settle_ms: u64,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            min_outline_level: 1,
            initial_expansion_level: 1,
            breadcrumb_mode: BreadcrumbMode::Anchor,
            extended_breadcrumb: false,
            scroll_settle_ms: 200,
        }
    }
}

/// Outline view over a [`TreeSource`], rendering rows through `F` and
/// reporting to `L`.
pub struct Outline<F: RowFactory, L: OutlineListener = NoopListener> {
    config: OutlineConfig,
    geometry: Geometry,
    tree: OutlineTree,
    filter: Box<dyn NodeFilter>,
    filter_stale: bool,
    index: VisibleNodeIndex,
    viewport: Viewport,
    blocks: BlockRenderer<F>,
    breadcrumb: BreadcrumbTracker,
    selection: SelectionController,
    expansion: ExpansionControls,
    focus: FocusManager,
    debouncer: ScrollDebouncer,
    listener: L,
    stash: HashMap<(NodeId, FilterIdentity), ViewState>,
    has_focus: bool,
    focus_request: Option<NodeId>,
    force_render: bool,
}

impl<F: RowFactory, L: OutlineListener> std::fmt::Debug for Outline<F, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outline")
            .field("root", &self.tree.root())
            .field("visible", &self.index.len())
            .field("selected", &self.selection.selected())
            .field("filter", &self.filter.identity())
            .field("scroll", &self.viewport.scroll_offset())
            .finish_non_exhaustive()
    }
}

impl<F: RowFactory, L: OutlineListener> Outline<F, L> {
    /// Display the whole of `source`, starting with its root selected.
    pub fn new(
        source: &dyn TreeSource,
        config: OutlineConfig,
        geometry: GeometryConfig,
        factory: F,
        listener: L,
        viewport_height: u32,
    ) -> Self {
        let geometry = Geometry::new(geometry);
        let mut viewport = Viewport::new(viewport_height, geometry.row_height(), config.block_size);
        viewport.set_content_origin_y(geometry.content_origin_y());
        let tree = build_tree(source, source.root());
        let root = tree.root();
        let mut outline = Self {
            config,
            geometry,
            tree,
            filter: Box::new(AcceptAll),
            filter_stale: true,
            index: VisibleNodeIndex::new(),
            viewport,
            blocks: BlockRenderer::new(factory),
            breadcrumb: BreadcrumbTracker::new(config.breadcrumb_mode, config.extended_breadcrumb),
            selection: SelectionController::new(),
            expansion: ExpansionControls::new(config.min_outline_level),
            focus: FocusManager::new(),
            debouncer: ScrollDebouncer::new(config.scroll_settle_ms),
            listener,
            stash: HashMap::new(),
            has_focus: false,
            focus_request: None,
            force_render: true,
        };
        outline.apply_default_expansion();
        outline.selection.set(&outline.tree, root);
        outline.breadcrumb.note_selection(&outline.tree, root);
        outline.refresh();
        outline
    }

    pub const fn config(&self) -> &OutlineConfig {
        &self.config
    }

    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub const fn tree(&self) -> &OutlineTree {
        &self.tree
    }

    pub const fn index(&self) -> &VisibleNodeIndex {
        &self.index
    }

    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub const fn blocks(&self) -> &BlockRenderer<F> {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut BlockRenderer<F> {
        &mut self.blocks
    }

    pub const fn breadcrumb(&self) -> &BreadcrumbTracker {
        &self.breadcrumb
    }

    pub const fn selected(&self) -> Option<NodeId> {
        self.selection.selected()
    }

    pub const fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn filter_identity(&self) -> FilterIdentity {
        self.filter.identity()
    }

    pub fn filter(&self) -> &dyn NodeFilter {
        self.filter.as_ref()
    }

    pub const fn is_scroll_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub const fn has_focus(&self) -> bool {
        self.has_focus
    }

    /// Tell the outline whether UI focus is currently inside it.
    pub fn set_has_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
        self.focus
            .set_focused(if has_focus { self.selected() } else { None });
    }

    pub const fn focused(&self) -> Option<NodeId> {
        self.focus.focused()
    }

    /// The node whose row should receive focus, once, after layout.
    pub fn take_focus_request(&mut self) -> Option<NodeId> {
        self.focus_request.take()
    }

    /// Run the recompute pipeline: index, breadcrumb, blocks, focus.
    pub fn refresh(&mut self) -> RenderOutcome {
        let _scope = crate::perf::scope("outline.refresh");
        if !self.index.is_current(&self.tree) || self.filter_stale {
            if std::mem::take(&mut self.filter_stale) {
                self.filter.prepare(&self.tree);
            }
            self.index.rebuild(&self.tree, self.filter.as_ref());
            self.viewport.set_visible_count(self.index.len());
            self.fix_selection();
        }
        self.update_breadcrumb();

        self.focus.capture(self.has_focus);
        let force = std::mem::take(&mut self.force_render);
        let rows = RowContext {
            tree: &self.tree,
            index: &self.index,
            geometry: &self.geometry,
        };
        let outcome = self
            .blocks
            .render(&self.viewport, self.index.generation(), force, &rows);
        let blocks = &self.blocks;
        if let Some(node) = self
            .focus
            .restore(self.selection.selected(), |id| blocks.row_for_node(id).is_some())
        {
            self.focus_request = Some(node);
        }
        outcome
    }

    // --- selection -------------------------------------------------------

    /// Select `node` from inside the outline; the host is notified.
    pub fn select(&mut self, node: NodeId, request_focus: bool) -> bool {
        self.select_with(node, request_focus, SelectionTrigger::Internal)
    }

    /// Apply a selection made in the host view. The host is not notified back.
    pub fn select_external(&mut self, node: NodeId) -> bool {
        self.select_with(node, false, SelectionTrigger::External)
    }

    /// Push the current selection to the host.
    pub fn select_in_host(&mut self) -> bool {
        let Some(selected) = self.selection.selected() else {
            return false;
        };
        self.listener
            .selection_changed(selected, SelectionTrigger::Internal);
        true
    }

    /// Select the node shown on visible row `row` (e.g. a click).
    pub fn select_row(&mut self, row: usize) -> bool {
        match self.index.node_at(row) {
            Some(node) => self.select(node, true),
            None => false,
        }
    }

    fn select_with(&mut self, node: NodeId, request_focus: bool, trigger: SelectionTrigger) -> bool {
        if !self.tree.contains(node) {
            tracing::warn!(node = %node, ?trigger, "ignoring selection of unknown node");
            return false;
        }
        if !self.index.contains(node) {
            if let Err(err) = self.tree.reveal(node) {
                tracing::warn!(%err, "cannot reveal selection");
            }
            self.force_render = true;
            self.refresh();
        }
        // Expansion cannot show a node the filter rejects.
        let target = if self.index.contains(node) {
            node
        } else {
            let index = &self.index;
            let fallback =
                SelectionController::fallback_for(&self.tree, node, |id| index.contains(id));
            tracing::debug!(from = %node, to = %fallback, "selection target is filtered out");
            fallback
        };
        let outcome = self.selection.set(&self.tree, target);
        if outcome.is_changed() {
            self.breadcrumb.note_selection(&self.tree, target);
        }
        self.refresh();
        self.ensure_visible(target);
        if request_focus {
            self.focus.set_focused(Some(target));
            self.focus_request = Some(target);
        }
        if outcome.is_changed() && trigger.notifies_host() {
            self.listener.selection_changed(target, trigger);
        }
        outcome.is_changed()
    }

    /// Scroll the minimum needed for `node`'s row to be fully visible.
    fn ensure_visible(&mut self, node: NodeId) {
        for _ in 0..2 {
            let Some(index) = self.index.index_of(node) else {
                return;
            };
            let Some(offset) = navigation::scroll_to_reveal(&self.nav_context(), index) else {
                return;
            };
            self.viewport.scroll_to(offset);
            self.refresh();
        }
    }

    /// Move a selection that is no longer shown to its nearest shown ancestor.
    fn fix_selection(&mut self) {
        let Some(selected) = self.selection.selected() else {
            return;
        };
        if self.index.contains(selected) {
            return;
        }
        let index = &self.index;
        let fallback =
            SelectionController::fallback_for(&self.tree, selected, |id| index.contains(id));
        tracing::debug!(from = %selected, to = %fallback, "selection fell back");
        self.selection.set(&self.tree, fallback);
        self.breadcrumb.note_selection(&self.tree, fallback);
        self.listener
            .selection_changed(fallback, SelectionTrigger::Internal);
    }

    // --- navigation and expansion ---------------------------------------

    fn nav_context(&self) -> NavContext<'_> {
        NavContext {
            tree: &self.tree,
            index: &self.index,
            viewport: &self.viewport,
            geometry: &self.geometry,
            breadcrumb: &self.breadcrumb,
            selection: &self.selection,
            expansion: &self.expansion,
        }
    }

    /// Move the selection. Returns `false` when nothing happened.
    pub fn navigate(&mut self, direction: Direction) -> bool {
        let action = navigation::plan(&self.nav_context(), direction);
        tracing::debug!(?direction, ?action, "navigate");
        match action {
            NavAction::None => false,
            NavAction::Select { node, scroll } => {
                if let Some(offset) = scroll {
                    self.viewport.scroll_to(offset);
                }
                self.select_with(node, self.has_focus, SelectionTrigger::Internal);
                true
            }
            NavAction::Collapse(node) => self.apply_expansion(node, ExpansionControls::collapse),
            NavAction::ExpandAndSelect { node, child } => {
                self.apply_expansion(node, ExpansionControls::expand);
                self.select_with(child, self.has_focus, SelectionTrigger::Internal);
                true
            }
        }
    }

    /// Collapse the selection if expanded and collapsible, else show one more level.
    pub fn toggle_expand(&mut self) -> bool {
        self.with_selection(ExpansionControls::toggle)
    }

    pub fn expand(&mut self) -> bool {
        self.with_selection(ExpansionControls::expand)
    }

    pub fn collapse(&mut self) -> bool {
        self.with_selection(ExpansionControls::collapse)
    }

    pub fn expand_more(&mut self) -> bool {
        self.with_selection(ExpansionControls::expand_more)
    }

    pub fn reduce(&mut self) -> bool {
        self.with_selection(ExpansionControls::reduce)
    }

    fn with_selection(
        &mut self,
        op: fn(&ExpansionControls, &mut OutlineTree, NodeId) -> Result<bool, TreeError>,
    ) -> bool {
        match self.selection.selected() {
            Some(node) => self.apply_expansion(node, op),
            None => false,
        }
    }

    fn apply_expansion(
        &mut self,
        node: NodeId,
        op: fn(&ExpansionControls, &mut OutlineTree, NodeId) -> Result<bool, TreeError>,
    ) -> bool {
        match op(&self.expansion, &mut self.tree, node) {
            Ok(true) => {
                self.refresh();
                if let Some(selected) = self.selection.selected() {
                    self.ensure_visible(selected);
                }
                true
            }
            Ok(false) => false,
            Err(err) => {
                tracing::warn!(%err, "expansion change failed");
                false
            }
        }
    }

    // --- scrolling --------------------------------------------------------

    /// Scroll to `offset`. Rows move immediately; the breadcrumb follows
    /// once no scroll has arrived for the settle period.
    pub fn scroll_to(&mut self, offset: u64, now_ms: u64) {
        self.viewport.scroll_to(offset);
        self.debouncer.queue(now_ms);
        if self.blocks.covers(&self.viewport) {
            self.blocks.reposition(&self.viewport);
        } else {
            let rows = RowContext {
                tree: &self.tree,
                index: &self.index,
                geometry: &self.geometry,
            };
            self.blocks
                .render(&self.viewport, self.index.generation(), false, &rows);
        }
    }

    pub fn scroll_by(&mut self, delta: i64, now_ms: u64) {
        let mut target = self.viewport;
        target.scroll_by(delta);
        self.scroll_to(target.scroll_offset(), now_ms);
    }

    /// Run the deferred recomputation if scrolling has settled.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if self.debouncer.take_ready(now_ms) {
            self.refresh();
            return true;
        }
        false
    }

    /// Milliseconds until [`Self::tick`] has work to do.
    pub const fn next_tick_in(&self, now_ms: u64) -> Option<u64> {
        self.debouncer.remaining_ms(now_ms)
    }

    // --- configuration changes -------------------------------------------

    /// Replace the geometry; every row is rebuilt.
    pub fn set_geometry(&mut self, config: GeometryConfig) {
        self.geometry = Geometry::new(config);
        self.viewport.set_row_height(self.geometry.row_height());
        self.viewport
            .set_content_origin_y(self.geometry.content_origin_y());
        self.viewport
            .set_breadcrumb_height(self.geometry.breadcrumb_height(self.breadcrumb.len()));
        self.force_render = true;
        self.refresh();
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        if self.viewport.height() != height {
            self.viewport.set_height(height);
            self.refresh();
        }
    }

    pub fn set_breadcrumb_mode(&mut self, mode: BreadcrumbMode) {
        self.breadcrumb.set_mode(mode);
        self.refresh();
    }

    pub fn set_extended_breadcrumb(&mut self, extended: bool) {
        self.breadcrumb.set_extended(extended);
        self.refresh();
    }

    pub fn set_min_outline_level(&mut self, level: usize) {
        self.expansion = ExpansionControls::new(level);
        if let Err(err) = self.expansion.enforce_minimum(&mut self.tree) {
            tracing::warn!(%err, "cannot enforce minimum outline level");
        }
        self.refresh();
    }

    fn update_breadcrumb(&mut self) {
        let anchor = self
            .viewport
            .first_visible_row()
            .and_then(|row| self.index.node_at(row));
        let update = self
            .breadcrumb
            .update(&self.tree, anchor, self.selection.selected());
        if update.height_changed {
            self.viewport
                .set_breadcrumb_height(self.geometry.breadcrumb_height(self.breadcrumb.len()));
            self.force_render = true;
        }
    }

    // --- tree events ------------------------------------------------------

    /// Mirror a change of the external tree. Events outside the displayed
    /// subtree are ignored.
    pub fn apply_event(&mut self, source: &dyn TreeSource, event: TreeEvent) -> bool {
        let _scope = crate::perf::scope("outline.apply_event");
        if self.moves_context(event) {
            tracing::debug!(?event, "displayed root or its ancestry changed");
            self.reload(source);
            return true;
        }
        let result = match event {
            TreeEvent::Inserted {
                parent,
                child,
                index,
            } => self.insert_from_source(source, parent, child, index),
            TreeEvent::Removed { child, .. } => self.remove_node(child),
            TreeEvent::Moved {
                new_parent, child, ..
            } => self.move_from_source(source, new_parent, child),
            TreeEvent::Changed { node } => match source.text(node) {
                // Detached ancestors keep their text for the breadcrumb.
                Some(text) if self.tree.node(node).is_some() => {
                    self.tree.set_text(node, text).map(|()| true)
                }
                _ => Ok(false),
            },
        };
        match result {
            Ok(true) => {
                tracing::debug!(?event, "tree event applied");
                self.filter_stale = true;
                self.listener.structure_changed();
                self.refresh();
                true
            }
            Ok(false) => {
                tracing::debug!(?event, "tree event outside displayed subtree");
                false
            }
            Err(err) => {
                tracing::warn!(%err, ?event, "ignoring tree event");
                false
            }
        }
    }

    /// Whether `event` removes or moves the displayed root or one of its
    /// detached ancestors.
    fn moves_context(&self, event: TreeEvent) -> bool {
        let child = match event {
            TreeEvent::Removed { child, .. } | TreeEvent::Moved { child, .. } => child,
            TreeEvent::Inserted { .. } | TreeEvent::Changed { .. } => return false,
        };
        child == self.tree.root() || self.tree.detached_ancestors().contains(&child)
    }

    fn insert_from_source(
        &mut self,
        source: &dyn TreeSource,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<bool, TreeError> {
        if !self.tree.contains(parent) {
            return Ok(false);
        }
        let text = source.text(child).ok_or(TreeError::UnknownNode(child))?;
        self.tree.insert(parent, child, text, index)?;
        let mut stack = vec![child];
        while let Some(current) = stack.pop() {
            for grandchild in source.children(current) {
                let text = source.text(*grandchild).unwrap_or_default();
                self.tree
                    .insert(current, *grandchild, text, usize::MAX)?;
                stack.push(*grandchild);
            }
        }
        Ok(true)
    }

    fn remove_node(&mut self, child: NodeId) -> Result<bool, TreeError> {
        if !self.tree.contains(child) {
            return Ok(false);
        }
        let parent = self.tree.parent(child);
        let removed = self.tree.remove(child)?;
        self.breadcrumb.forget(&removed);
        if self.selection.forget(&removed) {
            let fallback = parent.unwrap_or_else(|| self.tree.root());
            self.selection.set(&self.tree, fallback);
            self.listener
                .selection_changed(fallback, SelectionTrigger::Internal);
        }
        if self.focus.focused().is_some_and(|id| removed.contains(&id)) {
            self.focus.set_focused(self.selection.selected());
        }
        Ok(true)
    }

    fn move_from_source(
        &mut self,
        source: &dyn TreeSource,
        new_parent: NodeId,
        child: NodeId,
    ) -> Result<bool, TreeError> {
        let index = source
            .children(new_parent)
            .iter()
            .position(|id| *id == child)
            .unwrap_or(usize::MAX);
        match (self.tree.contains(child), self.tree.contains(new_parent)) {
            (true, true) => self.tree.move_node(child, new_parent, index).map(|()| true),
            (true, false) => self.remove_node(child),
            (false, true) => self.insert_from_source(source, new_parent, child, index),
            (false, false) => Ok(false),
        }
    }

    // --- context swaps and view state ------------------------------------

    /// Snapshot the current (root, filter) context.
    pub fn capture_view_state(&self) -> ViewState {
        let first_visible = self
            .viewport
            .first_visible_row()
            .and_then(|row| self.index.node_at(row));
        ViewState::capture(
            &self.tree,
            self.filter.identity(),
            first_visible,
            self.selection.selected(),
        )
    }

    /// Restore a snapshot taken in the current (root, filter) context.
    ///
    /// Returns `false`, changing nothing, when the snapshot belongs to a
    /// different context. Stale ids inside a matching snapshot are skipped.
    pub fn apply_view_state(&mut self, state: &ViewState) -> bool {
        let identity = self.filter.identity();
        if !state.matches(self.tree.root(), &identity) {
            tracing::debug!(
                root = %state.root_node,
                filter = %state.filter_identity,
                "view state belongs to another context"
            );
            return false;
        }
        let applied = state.apply_levels(&mut self.tree);
        if let Err(err) = self.expansion.enforce_minimum(&mut self.tree) {
            tracing::warn!(%err, "cannot enforce minimum outline level");
        }
        tracing::debug!(applied, "view state applied");
        self.force_render = true;
        self.refresh();

        if let Some(selected) = state.selected_node.filter(|id| self.index.contains(*id)) {
            self.selection.set(&self.tree, selected);
            self.breadcrumb.note_selection(&self.tree, selected);
        }
        match state
            .first_visible_node
            .and_then(|id| self.index.index_of(id))
        {
            Some(row) => self.viewport.scroll_row_to_top(row),
            None => self.viewport.scroll_to(0),
        }
        self.refresh();
        true
    }

    /// Show `filter`, stashing the state of the current one.
    pub fn set_filter(&mut self, filter: Box<dyn NodeFilter>) {
        self.stash_current();
        self.filter = filter;
        self.filter.prepare(&self.tree);
        self.filter_stale = false;
        let identity = self.filter.identity();
        tracing::debug!(filter = %identity, "filter changed");
        self.restore_or_default();
        self.listener.filter_changed(&identity);
    }

    pub fn clear_filter(&mut self) {
        self.set_filter(Box::new(AcceptAll));
    }

    /// Display the subtree of `source` rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not part of `source`.
    pub fn set_root(&mut self, source: &dyn TreeSource, root: NodeId) -> Result<(), TreeError> {
        if !source.contains(root) {
            return Err(TreeError::UnknownNode(root));
        }
        self.stash_current();
        self.replace_tree(build_tree(source, root));
        self.restore_or_default();
        self.listener.structure_changed();
        Ok(())
    }

    /// Rebuild every wrapper from `source`, keeping the displayed root when
    /// it still exists and carrying the view state across.
    pub fn reload(&mut self, source: &dyn TreeSource) {
        let state = self.capture_view_state();
        let root = self.surviving_root(source);
        self.replace_tree(build_tree(source, root));
        if !self.apply_view_state(&state) {
            self.apply_default_expansion();
            self.viewport.scroll_to(0);
            self.refresh();
        }
        self.listener.structure_changed();
    }

    /// The displayed root if `source` still has it, else its nearest
    /// surviving ancestor, else the source root.
    fn surviving_root(&self, source: &dyn TreeSource) -> NodeId {
        std::iter::once(self.tree.root())
            .chain(self.tree.detached_ancestors().iter().rev().copied())
            .find(|id| source.contains(*id))
            .unwrap_or_else(|| source.root())
    }

    fn replace_tree(&mut self, tree: OutlineTree) {
        let previous = self.selection.selected();
        self.tree = tree;
        self.filter_stale = true;
        self.selection = SelectionController::new();
        self.breadcrumb = BreadcrumbTracker::new(self.breadcrumb.mode(), self.breadcrumb.extended());
        let selected = previous
            .filter(|id| self.tree.contains(*id))
            .unwrap_or_else(|| self.tree.root());
        self.selection.set(&self.tree, selected);
        self.breadcrumb.note_selection(&self.tree, selected);
        if previous != Some(selected) {
            self.listener
                .selection_changed(selected, SelectionTrigger::Internal);
        }
        self.force_render = true;
    }

    fn stash_current(&mut self) {
        let state = self.capture_view_state();
        self.stash
            .insert((state.root_node, state.filter_identity.clone()), state);
    }

    fn restore_or_default(&mut self) {
        let key = (self.tree.root(), self.filter.identity());
        let stashed = self.stash.get(&key).cloned();
        let restored = stashed.is_some_and(|state| self.apply_view_state(&state));
        if !restored {
            self.apply_default_expansion();
            self.viewport.scroll_to(0);
            self.force_render = true;
            self.refresh();
        }
    }

    fn apply_default_expansion(&mut self) {
        self.tree.reset_expansion();
        let root = self.tree.root();
        let result = self
            .tree
            .expand_at_least(root, self.config.initial_expansion_level)
            .and_then(|()| self.expansion.enforce_minimum(&mut self.tree));
        if let Err(err) = result {
            tracing::warn!(%err, "cannot apply default expansion");
        }
        if self.filter_stale {
            self.filter.prepare(&self.tree);
            self.filter_stale = false;
        }
        for node in self.filter.reveals() {
            if let Err(err) = self.tree.reveal(node) {
                tracing::debug!(%err, "filter match vanished");
            }
        }
    }
}

/// Row models read straight from the wrapper tree and index.
struct RowContext<'a> {
    tree: &'a OutlineTree,
    index: &'a VisibleNodeIndex,
    geometry: &'a Geometry,
}

impl RowSource for RowContext<'_> {
    fn row_count(&self) -> usize {
        self.index.len()
    }

    fn row_model(&self, index: usize) -> Option<RowModel> {
        let node = self.index.node_at(index)?;
        let wrapper = self.tree.node(node)?;
        let depth = self.tree.depth_below_root(node)?;
        let title = wrapper.title().to_string();
        let expander = if !wrapper.has_children() {
            Expander::Leaf
        } else if wrapper.is_expanded() {
            Expander::Expanded
        } else {
            Expander::Collapsed
        };
        let title_width = u32::try_from(title.width()).unwrap_or(u32::MAX);
        Some(RowModel {
            node,
            index,
            depth,
            text_x: self.geometry.text_x(depth),
            width: self.geometry.row_width(depth, title_width),
            title,
            expander,
        })
    }
}

/// Build wrappers for the subtree of `source` at `root`, with the source
/// ancestors of `root` as detached breadcrumb-only nodes.
fn build_tree(source: &dyn TreeSource, root: NodeId) -> OutlineTree {
    let _scope = crate::perf::scope("outline.build_tree");
    let mut ancestors = Vec::new();
    let mut current = source.parent(root);
    while let Some(id) = current {
        ancestors.push((id, source.text(id).unwrap_or_default().to_string()));
        current = source.parent(id);
    }
    ancestors.reverse();
    let mut tree = OutlineTree::with_detached_ancestors(
        root,
        source.text(root).unwrap_or_default(),
        ancestors,
    );
    let mut stack = vec![root];
    while let Some(parent) = stack.pop() {
        for child in source.children(parent) {
            let text = source.text(*child).unwrap_or_default();
            match tree.insert(parent, *child, text, usize::MAX) {
                Ok(()) => stack.push(*child),
                Err(err) => tracing::warn!(%err, "skipping node while building outline"),
            }
        }
    }
    tracing::debug!(root = %root, nodes = tree.len(), "outline tree built");
    tree
}

//! Block-granular row rendering.
//!
//! Rows are created in fixed-size blocks. [`BlockRenderer::render`] diffs the
//! block range the [`Viewport`] asks for against the cached blocks, so
//! scrolling by a few rows touches no rows at all and scrolling by a block
//! creates exactly one block.
//!
//! The renderer is generic over a [`RowFactory`], the adapter to whatever
//! draws rows (terminal cells in this crate, widgets elsewhere).

use std::collections::BTreeMap;

use crate::tree::NodeId;
use crate::viewport::{BlockRange, Viewport};

/// State of a row's expand/collapse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expander {
    Leaf,
    Collapsed,
    Expanded,
}

/// Everything a factory needs to build one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowModel {
    pub node: NodeId,
    /// Position in the visible index.
    pub index: usize,
    /// Depth below the displayed root.
    pub depth: usize,
    pub title: String,
    pub expander: Expander,
    /// Leading offset of the title text.
    pub text_x: u32,
    /// Preferred width of the whole row.
    pub width: u32,
}

/// Creates, positions and destroys concrete rows.
pub trait RowFactory {
    type Row;

    fn create_row(&mut self, model: &RowModel) -> Self::Row;

    /// Move a row to viewport y `y`.
    fn position_row(&mut self, row: &mut Self::Row, y: i64);

    fn destroy_row(&mut self, row: Self::Row) {
        drop(row);
    }

    fn preferred_width(&self, row: &Self::Row) -> u32;
}

/// Supplies row models by visible index.
pub trait RowSource {
    fn row_count(&self) -> usize;
    fn row_model(&self, index: usize) -> Option<RowModel>;
}

/// One rendered row together with the node it shows.
#[derive(Debug)]
pub struct RenderedRow<R> {
    pub index: usize,
    pub node: NodeId,
    pub row: R,
}

#[derive(Debug)]
struct Block<R> {
    rows: Vec<RenderedRow<R>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    /// Same range and generation as last time; only positions were refreshed.
    ScrollOnly,
    /// Blocks entering or leaving the range were created or destroyed.
    Incremental,
    /// Every block was rebuilt.
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOutcome {
    pub kind: RenderKind,
    pub blocks_created: usize,
    pub blocks_destroyed: usize,
}

impl RenderOutcome {
    const fn scroll_only() -> Self {
        Self {
            kind: RenderKind::ScrollOnly,
            blocks_created: 0,
            blocks_destroyed: 0,
        }
    }
}

/// Cumulative counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub renders: u64,
    pub full_rebuilds: u64,
    pub blocks_created: u64,
    pub blocks_destroyed: u64,
    pub rows_created: u64,
    pub rows_destroyed: u64,
}

/// Preferred size of the row panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelSize {
    pub width: u32,
    pub height: u64,
}

#[derive(Debug)]
pub struct BlockRenderer<F: RowFactory> {
    factory: F,
    blocks: BTreeMap<usize, Block<F::Row>>,
    block_size: usize,
    last: Option<(Option<BlockRange>, u64)>,
    preferred_size: PanelSize,
    stats: RenderStats,
}

impl<F: RowFactory> BlockRenderer<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            blocks: BTreeMap::new(),
            block_size: 1,
            last: None,
            preferred_size: PanelSize::default(),
            stats: RenderStats::default(),
        }
    }

    pub const fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// Bring the cached blocks in line with `viewport`.
    ///
    /// `generation` is the visible index generation the rows come from. A
    /// changed generation, a changed block size, or `force` rebuild every
    /// block.
    pub fn render(
        &mut self,
        viewport: &Viewport,
        generation: u64,
        force: bool,
        rows: &dyn RowSource,
    ) -> RenderOutcome {
        let _scope = crate::perf::scope("blocks.render");
        self.stats.renders += 1;
        let range = viewport.block_range();
        let key = (range, generation);
        let block_size_changed = self.block_size != viewport.block_size();

        if !force && !block_size_changed && self.last == Some(key) {
            self.reposition(viewport);
            return RenderOutcome::scroll_only();
        }

        let full = force || block_size_changed || self.last.is_none_or(|(_, g)| g != generation);
        let mut outcome = RenderOutcome {
            kind: if full {
                RenderKind::Full
            } else {
                RenderKind::Incremental
            },
            blocks_created: 0,
            blocks_destroyed: 0,
        };

        let stale: Vec<usize> = self
            .blocks
            .keys()
            .copied()
            .filter(|block| full || !range.is_some_and(|r| r.contains(*block)))
            .collect();
        for block in stale {
            if let Some(block) = self.blocks.remove(&block) {
                self.destroy_block(block);
                outcome.blocks_destroyed += 1;
            }
        }

        self.block_size = viewport.block_size();
        if let Some(range) = range {
            for block in range.iter() {
                if self.blocks.contains_key(&block) {
                    continue;
                }
                let built = self.create_block(viewport, BlockRange::new(block, block), rows);
                self.blocks.insert(block, built);
                outcome.blocks_created += 1;
            }
        }
        self.reposition(viewport);

        if full {
            self.stats.full_rebuilds += 1;
        }
        self.stats.blocks_created += outcome.blocks_created as u64;
        self.stats.blocks_destroyed += outcome.blocks_destroyed as u64;
        self.last = Some(key);
        self.recompute_preferred_size(viewport);
        tracing::debug!(
            kind = ?outcome.kind,
            created = outcome.blocks_created,
            destroyed = outcome.blocks_destroyed,
            range = ?range,
            "blocks rendered"
        );
        crate::perf::log_event(
            "blocks.render",
            format!(
                "kind={:?} created={} destroyed={} range={range:?}",
                outcome.kind, outcome.blocks_created, outcome.blocks_destroyed
            ),
        );
        outcome
    }

    /// Refresh row positions after a scroll without touching the block set.
    pub fn reposition(&mut self, viewport: &Viewport) {
        for block in self.blocks.values_mut() {
            for rendered in &mut block.rows {
                self.factory
                    .position_row(&mut rendered.row, viewport.row_screen_y(rendered.index));
            }
        }
    }

    /// Whether `viewport` still falls inside the blocks rendered last time.
    pub fn covers(&self, viewport: &Viewport) -> bool {
        match (viewport.block_range(), self.last) {
            (Some(range), Some((Some(rendered), _))) => {
                rendered.first() <= range.first() && range.last() <= rendered.last()
            }
            (None, Some((None, _))) => true,
            _ => false,
        }
    }

    /// Drop every block; the next render rebuilds from scratch.
    pub fn invalidate(&mut self) {
        let blocks = std::mem::take(&mut self.blocks);
        for block in blocks.into_values() {
            self.destroy_block(block);
            self.stats.blocks_destroyed += 1;
        }
        self.last = None;
    }

    pub const fn preferred_size(&self) -> PanelSize {
        self.preferred_size
    }

    pub const fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn rendered_blocks(&self) -> Vec<usize> {
        self.blocks.keys().copied().collect()
    }

    pub fn row_count(&self) -> usize {
        self.blocks.values().map(|block| block.rows.len()).sum()
    }

    /// Rendered rows in index order.
    pub fn rows(&self) -> impl Iterator<Item = &RenderedRow<F::Row>> {
        self.blocks.values().flat_map(|block| block.rows.iter())
    }

    pub fn row(&self, index: usize) -> Option<&RenderedRow<F::Row>> {
        let block = self.blocks.get(&(index / self.block_size))?;
        block.rows.iter().find(|rendered| rendered.index == index)
    }

    pub fn row_for_node(&self, node: NodeId) -> Option<&RenderedRow<F::Row>> {
        self.rows().find(|rendered| rendered.node == node)
    }

    fn create_block(
        &mut self,
        viewport: &Viewport,
        range: BlockRange,
        rows: &dyn RowSource,
    ) -> Block<F::Row> {
        let indices = viewport.rows_of(range);
        let mut block = Block {
            rows: Vec::with_capacity(indices.len()),
        };
        for index in indices.take_while(|index| *index < rows.row_count()) {
            let Some(model) = rows.row_model(index) else {
                tracing::warn!(index, "no row model for visible index");
                continue;
            };
            let mut row = self.factory.create_row(&model);
            self.factory
                .position_row(&mut row, viewport.row_screen_y(index));
            block.rows.push(RenderedRow {
                index,
                node: model.node,
                row,
            });
            self.stats.rows_created += 1;
        }
        block
    }

    fn destroy_block(&mut self, block: Block<F::Row>) {
        for rendered in block.rows {
            self.factory.destroy_row(rendered.row);
            self.stats.rows_destroyed += 1;
        }
    }

    fn recompute_preferred_size(&mut self, viewport: &Viewport) {
        let width = self
            .rows()
            .map(|rendered| self.factory.preferred_width(&rendered.row))
            .max()
            .unwrap_or(0);
        self.preferred_size = PanelSize {
            width,
            height: viewport.content_height(),
        };
    }
}

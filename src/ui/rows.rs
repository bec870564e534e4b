//! Terminal rows produced by the block renderer.

use crate::blocks::{Expander, RowFactory, RowModel};
use crate::tree::NodeId;

/// One outline row as drawn in the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRow {
    pub node: NodeId,
    pub depth: usize,
    pub title: String,
    pub expander: Expander,
    /// Leading offset of the title text, in cells.
    pub text_x: u32,
    /// Preferred width in cells.
    pub width: u32,
    /// Viewport y of the row's top edge; negative or past the bottom when
    /// the row sits in the overscan part of its block.
    pub y: i64,
}

impl TextRow {
    pub const fn expander_glyph(&self) -> &'static str {
        match self.expander {
            Expander::Leaf => " ",
            Expander::Collapsed => "▸",
            Expander::Expanded => "▾",
        }
    }
}

/// Builds [`TextRow`]s and counts how many are alive.
#[derive(Debug, Default)]
pub struct TextRowFactory {
    live_rows: usize,
}

impl TextRowFactory {
    pub const fn live_rows(&self) -> usize {
        self.live_rows
    }
}

impl RowFactory for TextRowFactory {
    type Row = TextRow;

    fn create_row(&mut self, model: &RowModel) -> TextRow {
        self.live_rows += 1;
        TextRow {
            node: model.node,
            depth: model.depth,
            title: model.title.clone(),
            expander: model.expander,
            text_x: model.text_x,
            width: model.width,
            y: 0,
        }
    }

    fn position_row(&mut self, row: &mut TextRow, y: i64) {
        row.y = y;
    }

    fn destroy_row(&mut self, _row: TextRow) {
        self.live_rows = self.live_rows.saturating_sub(1);
    }

    fn preferred_width(&self, row: &TextRow) -> u32 {
        row.width
    }
}

//! Terminal UI components.
//!
//! - [`rows`]: rows built by the block renderer
//! - [`style`]: colors
//!
//! The outline pane draws only the rows the block renderer currently holds,
//! so the cost of a frame depends on the window, not on the tree.

pub mod rows;
pub mod style;

mod overlays;
mod render;
mod status;

pub use render::{main_area, outline_inner_area, outline_viewport_height, render, split_panes};
pub use rows::{TextRow, TextRowFactory};

pub const FOOTER_ROWS: u16 = 1;
pub const OUTLINE_WIDTH_PERCENT: u16 = 40;
pub const HOST_WIDTH_PERCENT: u16 = 60;

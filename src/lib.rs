// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. tree::TreeError)
    clippy::module_name_repetitions
)]

//! # Outliner
//!
//! A virtualized outline view for very large trees.
//!
//! The outline mirrors an external tree ([`source::TreeSource`]) as a
//! wrapper tree with per-node expansion levels, flattens what is shown into
//! a visible index, and renders only the blocks of rows around the viewport.
//! A breadcrumb pins the ancestors of the top row (or of the selection)
//! above the rows, and per-context view state can be saved and restored.
//!
//! ## Architecture
//!
//! [`outline::Outline`] ties the pieces together and runs one recompute
//! pipeline after every change. The terminal front end in [`app`] uses The
//! Elm Architecture (TEA):
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`tree`]: Wrapper tree and expansion levels
//! - [`source`]: External tree access and change events
//! - [`filter`]: Node filters and their identities
//! - [`index`]: Visible node index
//! - [`viewport`], [`geometry`]: Scroll position, block ranges and row metrics
//! - [`blocks`]: Block-granular row rendering
//! - [`breadcrumb`], [`selection`], [`focus`], [`expansion`], [`navigation`]
//! - [`view_state`]: Saved per-context view state
//! - [`markdown`]: Markdown files as outline sources
//! - [`app`], [`ui`]: Terminal front end
//! - [`watcher`]: File watching

pub mod app;
pub mod blocks;
pub mod breadcrumb;
pub mod config;
pub mod debounce;
pub mod expansion;
pub mod filter;
pub mod focus;
pub mod geometry;
pub mod index;
pub mod listener;
pub mod markdown;
pub mod navigation;
pub mod outline;
pub mod perf;
pub mod selection;
pub mod source;
pub mod tree;
pub mod ui;
pub mod view_state;
pub mod viewport;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::blocks::{RowFactory, RowModel};
    pub use crate::filter::{AcceptAll, NodeFilter, TitleFilter};
    pub use crate::listener::OutlineListener;
    pub use crate::navigation::Direction;
    pub use crate::outline::{Outline, OutlineConfig};
    pub use crate::source::{MemoryTree, TreeEvent, TreeSource};
    pub use crate::tree::NodeId;
}

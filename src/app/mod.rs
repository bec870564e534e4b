//! Terminal front end and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! The outline sits in the left pane; the right pane shows the node the
//! outline last reported and plays the part of the host document view.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Model, OutlineView, Pane, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::geometry::GeometryConfig;
use crate::outline::OutlineConfig;

/// Main application struct that owns the terminal and runs the event loop.
#[derive(Debug)]
pub struct App {
    file_path: PathBuf,
    watch_enabled: bool,
    outline_config: OutlineConfig,
    geometry: GeometryConfig,
    state_path: Option<PathBuf>,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application for the given file.
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            watch_enabled: false,
            outline_config: OutlineConfig::default(),
            geometry: GeometryConfig::terminal(),
            state_path: None,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Enable or disable file watching.
    pub fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    pub const fn with_outline_config(mut self, config: OutlineConfig) -> Self {
        self.outline_config = config;
        self
    }

    pub const fn with_geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = geometry;
        self
    }

    /// Save and load view state at `path` instead of next to the file.
    pub fn with_state_path(mut self, path: Option<PathBuf>) -> Self {
        self.state_path = path;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}

#[cfg(test)]
mod tests;

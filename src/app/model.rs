use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::filter::TitleFilter;
use crate::geometry::GeometryConfig;
use crate::listener::QueuedListener;
use crate::outline::{Outline, OutlineConfig};
use crate::source::{MemoryTree, TreeSource};
use crate::tree::NodeId;
use crate::ui::TextRowFactory;
use crate::view_state::ViewState;

/// The outline widget as the terminal front end uses it.
pub type OutlineView = Outline<TextRowFactory, QueuedListener>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Which pane receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Outline,
    /// The node pane, standing in for the document view the outline is paired with.
    Host,
}

/// The complete application state.
///
/// The document lives in `source`; the outline only mirrors it.
#[derive(Debug)]
pub struct Model {
    pub outline: OutlineView,
    /// The parsed document
    pub source: MemoryTree,
    /// Path to the outlined file
    pub file_path: PathBuf,
    /// Where view state is saved; next to the file when unset
    pub state_path: Option<PathBuf>,
    /// Node shown in the node pane
    pub host_selected: NodeId,
    pub focus: Pane,
    /// Filter being typed, if the filter bar is open
    pub filter_input: Option<String>,
    pub help_visible: bool,
    pub watch_enabled: bool,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    pub should_quit: bool,
    terminal_size: (u16, u16),
    toast: Option<Toast>,
}

impl Model {
    pub fn new(
        file_path: PathBuf,
        source: MemoryTree,
        config: OutlineConfig,
        geometry: GeometryConfig,
        terminal_size: (u16, u16),
    ) -> Self {
        let height = crate::ui::outline_viewport_height(terminal_size.0, terminal_size.1);
        let mut outline = Outline::new(
            &source,
            config,
            geometry,
            TextRowFactory::default(),
            QueuedListener::default(),
            height,
        );
        outline.set_has_focus(true);
        let host_selected = source.root();
        let mut model = Self {
            outline,
            source,
            file_path,
            state_path: None,
            host_selected,
            focus: Pane::Outline,
            filter_input: None,
            help_visible: false,
            watch_enabled: false,
            config_global_path: None,
            config_local_path: None,
            should_quit: false,
            terminal_size,
            toast: None,
        };
        model.sync_host();
        model
    }

    pub const fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    pub(super) fn resize(&mut self, width: u16, height: u16) {
        self.terminal_size = (width, height);
        self.outline
            .set_viewport_height(crate::ui::outline_viewport_height(width, height));
    }

    /// Move selections the outline reported into the node pane.
    ///
    /// Only internal changes are followed; external ones came from the node
    /// pane in the first place.
    pub(super) fn sync_host(&mut self) {
        for (node, trigger) in self.outline.listener_mut().take_selections() {
            if trigger.notifies_host() {
                self.host_selected = node;
            }
        }
        if !self.source.contains(self.host_selected) {
            self.host_selected = self.source.root();
        }
    }

    /// Root-first chain of source ancestors of the node pane's node.
    pub fn host_path(&self) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.source.parent(self.host_selected);
        while let Some(id) = current {
            path.push(id);
            current = self.source.parent(id);
        }
        path.reverse();
        path
    }

    /// Move the node pane to the next or previous node in document order and
    /// tell the outline about it.
    pub(super) fn host_step(&mut self, forward: bool) {
        let order = self.source.pre_order();
        let Some(position) = order.iter().position(|id| *id == self.host_selected) else {
            return;
        };
        let next = if forward {
            order.get(position + 1)
        } else {
            position.checked_sub(1).and_then(|i| order.get(i))
        };
        if let Some(&node) = next {
            self.host_selected = node;
            self.outline.select_external(node);
        }
    }

    pub(super) fn apply_filter(&mut self, pattern: &str) {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            self.outline.clear_filter();
            return;
        }
        match TitleFilter::new(pattern) {
            Ok(filter) => {
                self.outline.set_filter(Box::new(filter));
                let shown = self.outline.index().len();
                if shown == 0 {
                    self.show_toast(ToastLevel::Warning, format!("No titles match '{pattern}'"));
                } else {
                    self.show_toast(ToastLevel::Info, format!("{shown} rows shown"));
                }
            }
            Err(err) => {
                tracing::debug!(%err, pattern, "invalid filter pattern");
                self.show_toast(ToastLevel::Error, format!("Invalid filter: {err}"));
            }
        }
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| crate::config::default_state_path(&self.file_path))
    }

    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn save_view_state(&self) -> Result<PathBuf> {
        let path = self.state_file();
        self.outline
            .capture_view_state()
            .save(&path)
            .with_context(|| format!("Failed to save view state to {}", path.display()))?;
        Ok(path)
    }

    /// Apply a saved view state, if there is one for this file.
    ///
    /// Returns whether a state was found and applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file exists but cannot be read.
    pub fn load_view_state(&mut self) -> Result<bool> {
        let path = self.state_file();
        if !Path::new(&path).exists() {
            return Ok(false);
        }
        let state = ViewState::load(&path)
            .with_context(|| format!("Failed to load view state from {}", path.display()))?;
        let applied = self.outline.apply_view_state(&state);
        self.sync_host();
        Ok(applied)
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    /// Reparse the file and rebuild the outline against it.
    ///
    /// Ids are derived from the document, so expansion and selection carry
    /// over for nodes that survived the edit.
    pub(super) fn reload_from_disk(&mut self) -> Result<()> {
        let source = crate::markdown::load_outline(&self.file_path)?;
        self.source = source;
        self.outline.reload(&self.source);
        self.sync_host();
        Ok(())
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(
            PathBuf::new(),
            MemoryTree::new("untitled"),
            OutlineConfig::default(),
            GeometryConfig::terminal(),
            (80, 24),
        )
    }
}

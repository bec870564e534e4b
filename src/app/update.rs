use crate::navigation::Direction;

use super::model::{Model, Pane, ToastLevel};

/// All possible events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Outline
    Navigate(Direction),
    ToggleExpand,
    ExpandMore,
    Reduce,
    /// Push the outline selection to the node pane
    SelectInHost,
    /// Select the node on visible row `n` (click)
    SelectRow(usize),
    /// Select the node of breadcrumb entry `n` (click)
    SelectCrumb(usize),
    /// Scroll by `delta` rows; the index catches up after the scroll settles
    Scroll { delta: i64, now_ms: u64 },
    /// Clock tick for settled scrolls and toasts
    Tick(u64),

    // Breadcrumb
    ToggleBreadcrumbMode,
    ToggleExtendedBreadcrumb,

    // Node pane
    HostNext,
    HostPrev,

    // Filter
    StartFilter,
    FilterInput(String),
    ApplyFilter,
    CancelFilterInput,
    ClearFilter,

    // State and file
    SaveViewState,
    ToggleWatch,
    FileChanged,
    ForceReload,

    // Window
    SwitchPane,
    ToggleHelp,
    HideHelp,
    Resize(u16, u16),
    Redraw,
    Quit,
}

/// Pure state transition; file and watcher side effects run afterwards in
/// the event loop.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::Navigate(direction) => {
            model.outline.navigate(direction);
        }
        Message::ToggleExpand => {
            model.outline.toggle_expand();
        }
        Message::ExpandMore => {
            model.outline.expand_more();
        }
        Message::Reduce => {
            model.outline.reduce();
        }
        Message::SelectInHost => {
            model.outline.select_in_host();
        }
        Message::SelectRow(row) => {
            model.focus = Pane::Outline;
            model.outline.set_has_focus(true);
            model.outline.select_row(row);
        }
        Message::SelectCrumb(position) => {
            let crumb = model.outline.breadcrumb().crumbs().get(position).copied();
            match crumb {
                Some(node) if model.outline.tree().contains(node) => {
                    model.outline.select(node, model.focus == Pane::Outline);
                }
                Some(node) => {
                    model.show_toast(
                        ToastLevel::Info,
                        format!("Node {node} is above the displayed root"),
                    );
                }
                None => {}
            }
        }
        Message::Scroll { delta, now_ms } => {
            let row_height = i64::from(model.outline.geometry().row_height());
            model.outline.scroll_by(delta.saturating_mul(row_height), now_ms);
        }
        Message::Tick(now_ms) => {
            model.outline.tick(now_ms);
        }

        Message::ToggleBreadcrumbMode => {
            let mode = model.outline.breadcrumb().mode().toggled();
            model.outline.set_breadcrumb_mode(mode);
        }
        Message::ToggleExtendedBreadcrumb => {
            let extended = !model.outline.breadcrumb().extended();
            model.outline.set_extended_breadcrumb(extended);
        }

        Message::HostNext => model.host_step(true),
        Message::HostPrev => model.host_step(false),

        Message::StartFilter => {
            let current = model
                .outline
                .filter_identity()
                .as_str()
                .strip_prefix("title:")
                .map(ToOwned::to_owned)
                .unwrap_or_default();
            model.filter_input = Some(current);
        }
        Message::FilterInput(text) => {
            model.filter_input = Some(text);
        }
        Message::ApplyFilter => {
            if let Some(pattern) = model.filter_input.take() {
                model.apply_filter(&pattern);
            }
        }
        Message::CancelFilterInput => {
            model.filter_input = None;
        }
        Message::ClearFilter => {
            model.filter_input = None;
            model.outline.clear_filter();
        }

        // Handled in side effects.
        Message::SaveViewState | Message::FileChanged | Message::ForceReload => {}
        Message::ToggleWatch => {
            model.watch_enabled = !model.watch_enabled;
        }

        Message::SwitchPane => {
            model.focus = match model.focus {
                Pane::Outline => Pane::Host,
                Pane::Host => Pane::Outline,
            };
            model.outline.set_has_focus(model.focus == Pane::Outline);
        }
        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
        }
        Message::HideHelp => {
            model.help_visible = false;
        }
        Message::Resize(width, height) => {
            model.resize(width, height);
        }
        Message::Redraw => {}
        Message::Quit => {
            model.should_quit = true;
        }
    }
    model.sync_host();
    model
}

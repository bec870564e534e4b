use std::path::Path;
use std::time::Duration;

use crate::app::{App, Message, Model, ToastLevel};
use crate::watcher::FileWatcher;

/// Quiet period before a burst of file events counts as one change.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

impl App {
    pub(super) fn make_file_watcher(path: &Path) -> notify::Result<FileWatcher> {
        FileWatcher::new(path, WATCH_DEBOUNCE)
    }

    pub(super) fn handle_message_side_effects(
        model: &mut Model,
        file_watcher: &mut Option<FileWatcher>,
        msg: &Message,
    ) {
        match msg {
            Message::ToggleWatch => {
                if model.watch_enabled {
                    match Self::make_file_watcher(&model.file_path) {
                        Ok(watcher) => {
                            *file_watcher = Some(watcher);
                            model.show_toast(ToastLevel::Info, "Watching file changes");
                        }
                        Err(err) => {
                            model.watch_enabled = false;
                            *file_watcher = None;
                            model.show_toast(
                                ToastLevel::Warning,
                                format!("Watch unavailable: {err}"),
                            );
                            crate::perf::log_event(
                                "watcher.error",
                                format!("failed path={} err={err}", model.file_path.display()),
                            );
                        }
                    }
                } else {
                    *file_watcher = None;
                    model.show_toast(ToastLevel::Info, "Watch disabled");
                }
            }
            Message::ForceReload | Message::FileChanged => {
                if let Err(err) = model.reload_from_disk() {
                    model.show_toast(ToastLevel::Error, format!("Reload failed: {err}"));
                    crate::perf::log_event(
                        "reload.error",
                        format!("failed path={} err={err}", model.file_path.display()),
                    );
                } else if matches!(msg, Message::ForceReload) {
                    model.show_toast(ToastLevel::Info, "Reloaded");
                }
            }
            Message::SaveViewState => match model.save_view_state() {
                Ok(path) => {
                    model.show_toast(
                        ToastLevel::Info,
                        format!("View state saved to {}", path.display()),
                    );
                }
                Err(err) => {
                    tracing::warn!(error = %err, "saving view state failed");
                    model.show_toast(ToastLevel::Error, format!("{err:#}"));
                }
            },
            _ => {}
        }
    }
}

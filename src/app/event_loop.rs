use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::watcher::FileWatcher;

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the terminal cannot be
    /// initialized, or the event loop hits an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let read_scope = crate::perf::scope("app.read_file");
        let source = crate::markdown::load_outline(&self.file_path)?;
        drop(read_scope);

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; outliner requires an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);
        crate::perf::log_event(
            "init.layout",
            format!(
                "terminal={}x{} nodes={} block_size={}",
                size.width,
                size.height,
                source.len(),
                self.outline_config.block_size
            ),
        );

        let mut model = Model::new(
            self.file_path.clone(),
            source,
            self.outline_config,
            self.geometry,
            (size.width, size.height),
        );
        model.watch_enabled = self.watch_enabled;
        model.state_path.clone_from(&self.state_path);
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);

        match model.load_view_state() {
            Ok(true) => tracing::debug!("restored view state"),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable view state");
                model.show_toast(ToastLevel::Warning, format!("{err:#}"));
            }
        }

        let result = Self::event_loop(&mut terminal, &mut model);

        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();

        result
    }

    fn event_loop(terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut file_watcher = if model.watch_enabled {
            match Self::make_file_watcher(&model.file_path) {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    model.watch_enabled = false;
                    model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                    crate::perf::log_event(
                        "watcher.error",
                        format!("failed path={} err={err}", model.file_path.display()),
                    );
                    None
                }
            }
        } else {
            None
        };
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;
        execute!(stdout(), EnableMouseCapture)?;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                crate::perf::log_event(
                    "event.resize.apply",
                    format!("frame={frame_idx} width={width} height={height}"),
                );
                *model = update(std::mem::take(model), Message::Resize(width, height));
                needs_render = true;
            }

            if model.outline.next_tick_in(now_ms) == Some(0) {
                *model = update(std::mem::take(model), Message::Tick(now_ms));
                needs_render = true;
            }

            if model.watch_enabled
                && file_watcher
                    .as_mut()
                    .is_some_and(FileWatcher::take_change_ready)
            {
                *model = update(std::mem::take(model), Message::FileChanged);
                Self::handle_message_side_effects(model, &mut file_watcher, &Message::FileChanged);
                needs_render = true;
            }

            let poll_ms = if needs_render {
                0
            } else if let Some(wait) = model.outline.next_tick_in(now_ms) {
                wait.clamp(1, 250)
            } else if resize_debouncer.is_pending() {
                10
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Refresh timestamp after poll wait so debouncers use accurate times.
                let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                let msg =
                    Self::handle_event(&event::read()?, model, event_ms, &mut resize_debouncer);
                if let Some(msg) = msg {
                    crate::perf::log_event(
                        "event.message",
                        format!("frame={frame_idx} msg={msg:?}"),
                    );
                    Self::dispatch(model, &mut file_watcher, msg);
                    needs_render = true;
                }

                // Coalesce key repeat and wheel bursts into a single render.
                let mut drained = 0_u32;
                while event::poll(Duration::from_millis(0))? {
                    let drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    let msg =
                        Self::handle_event(&event::read()?, model, drain_ms, &mut resize_debouncer);
                    if let Some(msg) = msg {
                        drained += 1;
                        Self::dispatch(model, &mut file_watcher, msg);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    crate::perf::log_event(
                        "event.drain",
                        format!("frame={frame_idx} drained={drained}"),
                    );
                }
            }

            if needs_render {
                frame_idx += 1;
                let stats = model.outline.blocks().stats();
                crate::perf::log_event(
                    "frame.prep",
                    format!(
                        "frame={frame_idx} scroll={} rows={} full_rebuilds={} resize_pending={}",
                        model.outline.viewport().scroll_offset(),
                        model.outline.blocks().row_count(),
                        stats.full_rebuilds,
                        resize_debouncer.is_pending()
                    ),
                );

                let draw_start = Instant::now();
                terminal.draw(|frame| Self::view(model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0
                    ),
                );
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }

    fn dispatch(model: &mut Model, file_watcher: &mut Option<FileWatcher>, msg: Message) {
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        Self::handle_message_side_effects(model, file_watcher, &side_msg);
    }
}

use crossterm::event::{self, Event, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::app::{App, Message, Model};
use crate::navigation::Direction;

use super::event_loop::ResizeDebouncer;
use super::model::Pane;

/// Rows moved per mouse wheel notch.
const WHEEL_ROWS: i64 = 3;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(*key, model, now_ms),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model, now_ms),
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model, now_ms: u64) -> Option<Message> {
        if model.help_visible {
            return None;
        }
        let (width, height) = model.terminal_size();
        let panes = crate::ui::split_panes(crate::ui::main_area(Rect::new(0, 0, width, height)));
        let outline_inner = crate::ui::outline_inner_area(width, height);
        let in_outline = point_in_rect(mouse.column, mouse.row, panes[0]);
        let in_host = point_in_rect(mouse.column, mouse.row, panes[1]);

        match mouse.kind {
            MouseEventKind::ScrollDown if in_outline => Some(Message::Scroll {
                delta: WHEEL_ROWS,
                now_ms,
            }),
            MouseEventKind::ScrollUp if in_outline => Some(Message::Scroll {
                delta: -WHEEL_ROWS,
                now_ms,
            }),
            MouseEventKind::ScrollDown if in_host => Some(Message::HostNext),
            MouseEventKind::ScrollUp if in_host => Some(Message::HostPrev),
            MouseEventKind::Up(MouseButton::Left)
                if point_in_rect(mouse.column, mouse.row, outline_inner) =>
            {
                let y = u32::from(mouse.row - outline_inner.y);
                let viewport = model.outline.viewport();
                if y < viewport.breadcrumb_height() {
                    let crumb = y / viewport.row_height().max(1);
                    return usize::try_from(crumb).ok().map(Message::SelectCrumb);
                }
                viewport.row_at_screen_y(y).map(Message::SelectRow)
            }
            MouseEventKind::Up(MouseButton::Left) if in_host && model.focus != Pane::Host => {
                Some(Message::SwitchPane)
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: event::KeyEvent, model: &Model, now_ms: u64) -> Option<Message> {
        if model.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('q' | '?') | KeyCode::F(1) => {
                    Some(Message::HideHelp)
                }
                _ => None,
            };
        }

        if let Some(input) = model.filter_input.as_ref() {
            return match key.code {
                KeyCode::Enter => Some(Message::ApplyFilter),
                KeyCode::Esc => Some(Message::CancelFilterInput),
                KeyCode::Backspace => {
                    let mut text = input.clone();
                    text.pop();
                    Some(Message::FilterInput(text))
                }
                KeyCode::Char(c)
                    if !key.modifiers.contains(KeyModifiers::CONTROL)
                        && !key.modifiers.contains(KeyModifiers::ALT) =>
                {
                    let mut text = input.clone();
                    text.push(c);
                    Some(Message::FilterInput(text))
                }
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char('q') => return Some(Message::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(Message::Quit);
            }
            KeyCode::Char('?') | KeyCode::F(1) => return Some(Message::ToggleHelp),
            KeyCode::Tab | KeyCode::BackTab => return Some(Message::SwitchPane),
            KeyCode::Char('w') => return Some(Message::ToggleWatch),
            KeyCode::Char('r' | 'R') => return Some(Message::ForceReload),
            KeyCode::Char('s') => return Some(Message::SaveViewState),
            KeyCode::Char('m') => return Some(Message::ToggleBreadcrumbMode),
            KeyCode::Char('x') => return Some(Message::ToggleExtendedBreadcrumb),
            KeyCode::Char('/') => return Some(Message::StartFilter),
            KeyCode::Esc => return Some(Message::ClearFilter),
            _ => {}
        }

        match model.focus {
            Pane::Outline => Self::handle_outline_key(key, model, now_ms),
            Pane::Host => match key.code {
                KeyCode::Char('j' | 'n') | KeyCode::Down => Some(Message::HostNext),
                KeyCode::Char('k' | 'p') | KeyCode::Up => Some(Message::HostPrev),
                _ => None,
            },
        }
    }

    fn handle_outline_key(key: event::KeyEvent, model: &Model, now_ms: u64) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(Message::Navigate(Direction::Down)),
            KeyCode::Char('k') | KeyCode::Up => Some(Message::Navigate(Direction::Up)),
            KeyCode::Char('h') | KeyCode::Left => Some(Message::Navigate(Direction::Left)),
            KeyCode::Char('l') | KeyCode::Right => Some(Message::Navigate(Direction::Right)),
            KeyCode::PageDown => Some(Message::Navigate(Direction::PageDown)),
            KeyCode::PageUp => Some(Message::Navigate(Direction::PageUp)),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::Navigate(Direction::Home)),
            KeyCode::Char('G') | KeyCode::End => Some(Message::Navigate(Direction::End)),
            KeyCode::Char('e') if ctrl => Some(Message::Scroll { delta: 1, now_ms }),
            KeyCode::Char('y') if ctrl => Some(Message::Scroll { delta: -1, now_ms }),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Message::ToggleExpand),
            KeyCode::Char('+' | '=') => Some(Message::ExpandMore),
            KeyCode::Char('-') => Some(Message::Reduce),
            KeyCode::Char('o') if model.outline.selected().is_some() => {
                Some(Message::SelectInHost)
            }
            _ => None,
        }
    }

    pub(super) fn view(model: &Model, frame: &mut Frame) {
        crate::ui::render(model, frame);
    }
}

fn point_in_rect(col: u16, row: u16, rect: Rect) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

use std::path::PathBuf;

use crossterm::event::{self, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tempfile::tempdir;

use crate::breadcrumb::BreadcrumbMode;
use crate::filter::FilterIdentity;
use crate::geometry::GeometryConfig;
use crate::markdown::{ROOT_ID, parse_outline};
use crate::navigation::Direction;
use crate::outline::OutlineConfig;
use crate::source::TreeSource;
use crate::tree::NodeId;

use super::event_loop::ResizeDebouncer;
use super::{App, Message, Model, Pane, ToastLevel, update};

const SAMPLE: &str = "# A\n\nAbout A.\n\n## A1\n\n## A2\n\n# B\n";

fn model_from(markdown: &str, size: (u16, u16)) -> Model {
    Model::new(
        PathBuf::from("test.md"),
        parse_outline(markdown, "test.md"),
        OutlineConfig::default(),
        GeometryConfig::terminal(),
        size,
    )
}

fn create_test_model() -> Model {
    model_from(SAMPLE, (80, 24))
}

fn create_long_test_model() -> Model {
    let mut md = String::new();
    for i in 1..=100 {
        md.push_str(&format!("# Heading {i}\n\n"));
    }
    model_from(&md, (80, 24))
}

fn node(model: &Model, title: &str) -> NodeId {
    model
        .source
        .pre_order()
        .into_iter()
        .find(|id| {
            model
                .source
                .text(*id)
                .is_some_and(|text| crate::tree::display_title(text) == title)
        })
        .unwrap()
}

fn key(code: KeyCode) -> event::KeyEvent {
    event::KeyEvent::new(code, KeyModifiers::NONE)
}

fn click(column: u16, row: u16) -> MouseEvent {
    MouseEvent {
        kind: MouseEventKind::Up(MouseButton::Left),
        column,
        row,
        modifiers: KeyModifiers::NONE,
    }
}

#[test]
fn test_new_model_shows_top_level_with_root_selected() {
    let model = create_test_model();
    let a = node(&model, "A");
    let b = node(&model, "B");
    assert_eq!(model.outline.index().nodes(), &[ROOT_ID, a, b]);
    assert_eq!(model.outline.selected(), Some(ROOT_ID));
    assert_eq!(model.host_selected, ROOT_ID);
}

#[test]
fn test_navigate_down_moves_host_too() {
    let model = create_test_model();
    let a = node(&model, "A");
    let model = update(model, Message::Navigate(Direction::Down));
    assert_eq!(model.outline.selected(), Some(a));
    assert_eq!(model.host_selected, a);
}

#[test]
fn test_right_expands_and_selects_first_child() {
    let model = create_test_model();
    let a1 = node(&model, "A1");
    let model = update(model, Message::Navigate(Direction::Down));
    let model = update(model, Message::Navigate(Direction::Right));
    assert_eq!(model.outline.selected(), Some(a1));
    assert_eq!(model.outline.index().len(), 5);
    assert_eq!(model.host_selected, a1);
}

#[test]
fn test_toggle_expand_shows_and_hides_children() {
    let model = create_test_model();
    let a1 = node(&model, "A1");
    let model = update(model, Message::Navigate(Direction::Down));
    let model = update(model, Message::ToggleExpand);
    assert!(model.outline.index().contains(a1));
    let model = update(model, Message::ToggleExpand);
    assert!(!model.outline.index().contains(a1));
}

#[test]
fn test_host_step_selects_in_outline_without_echo() {
    let model = create_test_model();
    let a = node(&model, "A");
    let a1 = node(&model, "A1");

    let mut model = update(model, Message::HostNext);
    assert_eq!(model.host_selected, a);
    assert_eq!(model.outline.selected(), Some(a));
    assert!(model.outline.listener().selections.is_empty());

    model = update(model, Message::HostNext);
    assert_eq!(model.host_selected, a1);
    assert!(model.outline.index().contains(a1), "external selection is revealed");

    model = update(model, Message::HostPrev);
    assert_eq!(model.host_selected, a);
}

#[test]
fn test_host_prev_at_root_stays() {
    let model = update(create_test_model(), Message::HostPrev);
    assert_eq!(model.host_selected, ROOT_ID);
}

#[test]
fn test_switch_pane_moves_outline_focus() {
    let model = create_test_model();
    assert!(model.outline.has_focus());
    let model = update(model, Message::SwitchPane);
    assert_eq!(model.focus, Pane::Host);
    assert!(!model.outline.has_focus());
    let model = update(model, Message::SwitchPane);
    assert_eq!(model.focus, Pane::Outline);
    assert!(model.outline.has_focus());
}

#[test]
fn test_breadcrumb_toggles() {
    let model = create_test_model();
    let model = update(model, Message::ToggleBreadcrumbMode);
    assert_eq!(model.outline.breadcrumb().mode(), BreadcrumbMode::FollowSelection);
    let model = update(model, Message::ToggleExtendedBreadcrumb);
    assert!(model.outline.breadcrumb().extended());
    let model = update(model, Message::ToggleBreadcrumbMode);
    assert_eq!(model.outline.breadcrumb().mode(), BreadcrumbMode::Anchor);
}

#[test]
fn test_select_crumb_jumps_to_ancestor() {
    let model = create_test_model();
    let a = node(&model, "A");
    let model = update(model, Message::ToggleBreadcrumbMode);
    let model = update(model, Message::Navigate(Direction::Down));
    let model = update(model, Message::Navigate(Direction::Right));
    assert_eq!(model.outline.breadcrumb().crumbs(), &[ROOT_ID, a]);

    let model = update(model, Message::SelectCrumb(1));
    assert_eq!(model.outline.selected(), Some(a));
    assert_eq!(model.host_selected, a);
}

#[test]
fn test_filter_flow() {
    let model = create_test_model();
    let a = node(&model, "A");
    let b = node(&model, "B");

    let model = update(model, Message::StartFilter);
    assert_eq!(model.filter_input.as_deref(), Some(""));
    let model = update(model, Message::FilterInput("b".to_string()));
    let model = update(model, Message::ApplyFilter);
    assert!(model.filter_input.is_none());
    assert_eq!(model.outline.filter_identity(), FilterIdentity::new("title:b"));
    assert!(model.outline.index().contains(b));
    assert!(!model.outline.index().contains(a));
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Info));

    let model = update(model, Message::StartFilter);
    assert_eq!(model.filter_input.as_deref(), Some("b"), "current pattern is prefilled");
    let model = update(model, Message::ClearFilter);
    assert_eq!(model.outline.filter_identity(), FilterIdentity::default());
    assert!(model.outline.index().contains(a));
}

#[test]
fn test_invalid_filter_shows_error_and_keeps_filter() {
    let model = update(create_test_model(), Message::FilterInput("(".to_string()));
    let model = update(model, Message::ApplyFilter);
    assert_eq!(model.outline.filter_identity(), FilterIdentity::default());
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Error));
}

#[test]
fn test_empty_filter_clears() {
    let model = update(create_test_model(), Message::FilterInput("b".to_string()));
    let model = update(model, Message::ApplyFilter);
    let model = update(model, Message::FilterInput("  ".to_string()));
    let model = update(model, Message::ApplyFilter);
    assert_eq!(model.outline.filter_identity(), FilterIdentity::default());
}

#[test]
fn test_scroll_settles_on_tick() {
    let model = create_long_test_model();
    let model = update(model, Message::Scroll { delta: 10, now_ms: 0 });
    assert_eq!(model.outline.viewport().scroll_offset(), 10);
    assert!(model.outline.is_scroll_pending());

    let model = update(model, Message::Tick(1_000));
    assert!(!model.outline.is_scroll_pending());
    assert_eq!(model.outline.viewport().scroll_offset(), 10);
}

#[test]
fn test_scroll_up_stops_at_top() {
    let model = create_long_test_model();
    let model = update(model, Message::Scroll { delta: -5, now_ms: 0 });
    assert_eq!(model.outline.viewport().scroll_offset(), 0);
}

#[test]
fn test_resize_updates_viewport_height() {
    let model = update(create_test_model(), Message::Resize(100, 30));
    assert_eq!(model.terminal_size(), (100, 30));
    // status row plus pane borders
    assert_eq!(model.outline.viewport().height(), 27);
}

#[test]
fn test_toggle_help_and_quit() {
    let model = update(create_test_model(), Message::ToggleHelp);
    assert!(model.help_visible);
    let model = update(model, Message::HideHelp);
    assert!(!model.help_visible);
    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_toggle_watch_flips_flag() {
    let model = update(create_test_model(), Message::ToggleWatch);
    assert!(model.watch_enabled);
}

#[test]
fn test_default_model_is_empty_outline() {
    let model = Model::default();
    assert_eq!(model.source.len(), 1);
    assert_eq!(model.outline.index().len(), 1);
}

#[test]
fn test_key_mapping_outline_pane() {
    let model = create_test_model();
    assert_eq!(
        App::handle_key(key(KeyCode::Char('j')), &model, 0),
        Some(Message::Navigate(Direction::Down))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Left), &model, 0),
        Some(Message::Navigate(Direction::Left))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Enter), &model, 0),
        Some(Message::ToggleExpand)
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Char('+')), &model, 0),
        Some(Message::ExpandMore)
    );
    assert_eq!(App::handle_key(key(KeyCode::Char('m')), &model, 0), Some(Message::ToggleBreadcrumbMode));
    assert_eq!(App::handle_key(key(KeyCode::Char('s')), &model, 0), Some(Message::SaveViewState));
    assert_eq!(App::handle_key(key(KeyCode::Char('?')), &model, 0), Some(Message::ToggleHelp));
    assert_eq!(
        App::handle_key(
            event::KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &model,
            0
        ),
        Some(Message::Quit)
    );
}

#[test]
fn test_key_mapping_host_pane() {
    let model = update(create_test_model(), Message::SwitchPane);
    assert_eq!(App::handle_key(key(KeyCode::Char('j')), &model, 0), Some(Message::HostNext));
    assert_eq!(App::handle_key(key(KeyCode::Up), &model, 0), Some(Message::HostPrev));
}

#[test]
fn test_help_swallows_keys() {
    let model = update(create_test_model(), Message::ToggleHelp);
    assert_eq!(App::handle_key(key(KeyCode::Char('j')), &model, 0), None);
    assert_eq!(App::handle_key(key(KeyCode::Esc), &model, 0), Some(Message::HideHelp));
}

#[test]
fn test_filter_bar_edits_input() {
    let model = update(create_test_model(), Message::FilterInput("ab".to_string()));
    assert_eq!(
        App::handle_key(key(KeyCode::Char('c')), &model, 0),
        Some(Message::FilterInput("abc".to_string()))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Backspace), &model, 0),
        Some(Message::FilterInput("a".to_string()))
    );
    assert_eq!(App::handle_key(key(KeyCode::Enter), &model, 0), Some(Message::ApplyFilter));
    assert_eq!(App::handle_key(key(KeyCode::Esc), &model, 0), Some(Message::CancelFilterInput));
}

#[test]
fn test_click_selects_row() {
    let model = create_test_model();
    let b = node(&model, "B");
    // Border at y=0; rows start at y=1.
    let msg = App::handle_mouse(click(5, 3), &model, 0);
    assert_eq!(msg, Some(Message::SelectRow(2)));
    let model = update(model, msg.unwrap());
    assert_eq!(model.outline.selected(), Some(b));
}

#[test]
fn test_click_below_rows_does_nothing() {
    let model = create_test_model();
    assert_eq!(App::handle_mouse(click(5, 15), &model, 0), None);
}

#[test]
fn test_wheel_scrolls_outline_and_steps_host() {
    let model = create_test_model();
    let wheel = |kind: MouseEventKind, column: u16| MouseEvent {
        kind,
        column,
        row: 5,
        modifiers: KeyModifiers::NONE,
    };
    assert_eq!(
        App::handle_mouse(wheel(MouseEventKind::ScrollDown, 5), &model, 42),
        Some(Message::Scroll { delta: 3, now_ms: 42 })
    );
    assert_eq!(
        App::handle_mouse(wheel(MouseEventKind::ScrollUp, 60), &model, 0),
        Some(Message::HostPrev)
    );
}

#[test]
fn test_view_state_saved_and_restored() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    let mut model = create_test_model();
    model.state_path = Some(state_path.clone());
    let a = node(&model, "A");
    let a1 = node(&model, "A1");
    let mut model = update(model, Message::Navigate(Direction::Down));
    model = update(model, Message::ToggleExpand);
    App::handle_message_side_effects(&mut model, &mut None, &Message::SaveViewState);
    assert!(state_path.exists());
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Info));

    let mut restored = create_test_model();
    restored.state_path = Some(state_path);
    assert!(restored.load_view_state().unwrap());
    assert!(restored.outline.index().contains(a1));
    assert_eq!(restored.outline.selected(), Some(a));
}

#[test]
fn test_missing_view_state_is_not_an_error() {
    let dir = tempdir().unwrap();
    let mut model = create_test_model();
    model.state_path = Some(dir.path().join("absent.json"));
    assert!(!model.load_view_state().unwrap());
}

#[test]
fn test_reload_keeps_selection_and_picks_up_edits() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, SAMPLE).unwrap();
    let source = crate::markdown::load_outline(&path).unwrap();
    let model = Model::new(
        path.clone(),
        source,
        OutlineConfig::default(),
        GeometryConfig::terminal(),
        (80, 24),
    );
    let a = node(&model, "A");
    let mut model = update(model, Message::Navigate(Direction::Down));

    std::fs::write(&path, format!("{SAMPLE}\n# C\n")).unwrap();
    App::handle_message_side_effects(&mut model, &mut None, &Message::ForceReload);

    let c = node(&model, "C");
    assert!(model.outline.index().contains(c));
    assert_eq!(model.outline.selected(), Some(a));
    assert_eq!(model.active_toast(), Some(("Reloaded", ToastLevel::Info)));
}

#[test]
fn test_reload_failure_shows_error() {
    let mut model = create_test_model();
    model.file_path = PathBuf::from("/definitely/not/here.md");
    App::handle_message_side_effects(&mut model, &mut None, &Message::FileChanged);
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Error));
}

#[test]
fn test_resize_debouncer_waits_for_quiet_period() {
    let mut debouncer = ResizeDebouncer::new(100);
    debouncer.queue(100, 30, 0);
    assert!(debouncer.is_pending());
    assert_eq!(debouncer.take_ready(50), None);
    debouncer.queue(120, 40, 60);
    assert_eq!(debouncer.take_ready(150), None);
    assert_eq!(debouncer.take_ready(160), Some((120, 40)));
    assert!(!debouncer.is_pending());
}

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};
use crate::breadcrumb::BreadcrumbMode;
use crate::filter::FilterIdentity;

pub fn render_filter_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let query = model.filter_input.as_deref().unwrap_or_default();
    let text = format!("filter: {query}  Enter: apply  Esc: cancel");
    let bar = Paragraph::new(text).style(Style::default().bg(Color::Blue).fg(Color::White));
    frame.render_widget(bar, area);
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let filename = model
        .file_path
        .file_name()
        .map_or_else(|| "untitled".to_string(), |s| s.to_string_lossy().to_string());

    let outline = &model.outline;
    let total = outline.index().len();
    let position = outline
        .selected()
        .and_then(|node| outline.index().index_of(node))
        .map_or_else(|| "-".to_string(), |index| (index + 1).to_string());

    let mode = match outline.breadcrumb().mode() {
        BreadcrumbMode::Anchor => "anchor",
        BreadcrumbMode::FollowSelection => "follow",
    };
    let extended = if outline.breadcrumb().extended() {
        "+ext"
    } else {
        ""
    };
    let watch_indicator = if model.watch_enabled {
        " [watching]"
    } else {
        ""
    };
    let filter_indicator = if model.outline.filter_identity() == FilterIdentity::default() {
        ""
    } else {
        " [filtered]"
    };

    let status = format!(
        " {filename}  Row {position}/{total}  [{mode}{extended}]{watch_indicator}{filter_indicator}  ?:help"
    );
    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}

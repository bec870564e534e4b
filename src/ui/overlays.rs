use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::Model;

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(6).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let global_cfg = model
        .config_global_path
        .as_ref()
        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
    let local_cfg = model
        .config_local_path
        .as_ref()
        .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let dim_style = Style::default().fg(Color::Indexed(245));

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::styled("Outline", section_style));
    lines.push(Line::raw("  j/k or Up/Down      Previous / next row"));
    lines.push(Line::raw("  h/l or Left/Right   Collapse or parent / expand or child"));
    lines.push(Line::raw("  PageUp/PageDown     Page"));
    lines.push(Line::raw("  g / G, Home/End     First / last row"));
    lines.push(Line::raw("  Enter / Space       Toggle expansion"));
    lines.push(Line::raw("  + / -               Expand one more level / reduce"));
    lines.push(Line::raw("  o                   Show in node pane"));
    lines.push(Line::raw("  Mouse wheel, click  Scroll, select"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Breadcrumb", section_style));
    lines.push(Line::raw("  m                   Anchor / follow selection"));
    lines.push(Line::raw("  x                   Extended trail"));
    lines.push(Line::raw("  click               Jump to ancestor"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Node pane", section_style));
    lines.push(Line::raw("  Tab                 Switch focus"));
    lines.push(Line::raw("  j/k or n/p          Next / previous node"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Filter", section_style));
    lines.push(Line::raw("  /                   Filter titles"));
    lines.push(Line::raw("  Esc                 Clear filter"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Other", section_style));
    lines.push(Line::raw("  s                   Save view state"));
    lines.push(Line::raw("  w                   Toggle watch"));
    lines.push(Line::raw("  r / R               Reload file"));
    lines.push(Line::raw("  q / Ctrl-c          Quit"));
    lines.push(Line::raw("  ? / F1              Toggle help"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Config", section_style));
    lines.push(Line::raw(format!("  Global: {global_cfg}")));
    lines.push(Line::raw(format!("  Local override: {local_cfg}")));

    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .padding(Padding::uniform(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));

    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    // border(1) + padding(1) on each side
    let inner = Rect::new(
        popup.x + 2,
        popup.y + 2,
        popup.width.saturating_sub(4),
        popup.height.saturating_sub(4),
    );

    let content_height = inner.height.saturating_sub(1);
    let visible: Vec<Line> = lines
        .into_iter()
        .take(usize::from(content_height))
        .collect();
    let content_area = Rect::new(inner.x, inner.y, inner.width, content_height);
    frame.render_widget(Paragraph::new(visible), content_area);

    let footer_area = Rect::new(inner.x, inner.y + content_height, inner.width, 1);
    let footer = Line::styled("Esc closes", dim_style);
    frame.render_widget(Paragraph::new(footer), footer_area);
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}

use ratatui::buffer::Buffer;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::app::{Model, Pane};
use crate::filter::FilterIdentity;
use crate::geometry::Geometry;
use crate::source::TreeSource;

use super::rows::TextRow;
use super::{FOOTER_ROWS, HOST_WIDTH_PERCENT, OUTLINE_WIDTH_PERCENT, overlays, status, style};

/// Area above the footer.
pub fn main_area(area: Rect) -> Rect {
    Rect {
        height: area.height.saturating_sub(FOOTER_ROWS),
        ..area
    }
}

pub fn split_panes(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(OUTLINE_WIDTH_PERCENT),
            Constraint::Percentage(HOST_WIDTH_PERCENT),
        ])
        .split(area)
}

/// Inner rect of the outline pane for a terminal of `width` x `height`.
pub fn outline_inner_area(width: u16, height: u16) -> Rect {
    let panes = split_panes(main_area(Rect::new(0, 0, width, height)));
    Block::default().borders(Borders::ALL).inner(panes[0])
}

pub fn outline_viewport_height(width: u16, height: u16) -> u32 {
    u32::from(outline_inner_area(width, height).height)
}

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let _scope = crate::perf::scope("ui.render");
    let area = frame.area();
    let panes = split_panes(main_area(area));
    render_outline(model, frame, panes[0]);
    render_host(model, frame, panes[1]);

    let footer = Rect {
        y: area.y + area.height.saturating_sub(FOOTER_ROWS),
        height: FOOTER_ROWS.min(area.height),
        ..area
    };
    if model.filter_input.is_some() {
        status::render_filter_bar(model, frame, footer);
    } else if model.active_toast().is_some() {
        status::render_toast_bar(model, frame, footer);
    } else {
        status::render_status_bar(model, frame, footer);
    }

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_outline(model: &Model, frame: &mut Frame, area: Rect) {
    let outline = &model.outline;
    let focused = model.focus == Pane::Outline;
    let identity = outline.filter_identity();
    let title = if identity == FilterIdentity::default() {
        "Outline".to_string()
    } else {
        format!("Outline [{identity}]")
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style::border_style(focused));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if outline.index().is_empty() {
        let empty = Paragraph::new("(nothing to show)").style(style::host_path_style());
        let crumb_rows = u16::try_from(outline.viewport().breadcrumb_height()).unwrap_or(0);
        let y = inner.y.saturating_add(crumb_rows);
        if y < inner.bottom() {
            frame.render_widget(empty, Rect::new(inner.x, y, inner.width, 1));
        }
    }

    let buf = frame.buffer_mut();
    let height = i64::from(inner.height);
    let crumb_height = i64::from(outline.viewport().breadcrumb_height());
    let geometry = outline.geometry();
    let selected = outline.selected();
    for rendered in outline.blocks().rows() {
        let row = &rendered.row;
        if row.y < crumb_height || row.y >= height {
            continue;
        }
        let Ok(offset) = u16::try_from(row.y) else {
            continue;
        };
        let is_selected = selected == Some(rendered.node);
        draw_row(buf, inner, inner.y + offset, row, geometry, is_selected, focused);
    }

    let tree = outline.tree();
    let row_height = geometry.row_height();
    for (i, crumb) in outline.breadcrumb().crumbs().iter().enumerate() {
        let y = u32::try_from(i).unwrap_or(u32::MAX).saturating_mul(row_height);
        let Ok(y) = u16::try_from(y) else {
            break;
        };
        if y >= inner.height {
            break;
        }
        let title = tree.title(*crumb).unwrap_or_default();
        let crumb_style = style::breadcrumb_style(!tree.contains(*crumb));
        let line = format!("{}› {title}", "  ".repeat(i));
        let row_area = Rect::new(inner.x, inner.y + y, inner.width, 1);
        buf.set_style(row_area, crumb_style);
        put(buf, inner, line_x(geometry, &line, inner.width), inner.y + y, &line, crumb_style);
    }
}

fn line_x(geometry: &Geometry, line: &str, panel_width: u16) -> u32 {
    let width = u32::try_from(line.width()).unwrap_or(u32::MAX);
    geometry.physical_x(0, width, u32::from(panel_width))
}

fn draw_row(
    buf: &mut Buffer,
    area: Rect,
    y: u16,
    row: &TextRow,
    geometry: &Geometry,
    selected: bool,
    focused: bool,
) {
    let panel_width = u32::from(area.width);
    let base = style::row_style(row.depth);
    let title_style = if selected {
        style::selected_style(base, focused)
    } else {
        base
    };
    if selected {
        let marker = if geometry.is_rtl() { "‹" } else { "›" };
        let x = geometry.physical_x(0, 1, panel_width);
        put(buf, area, x, y, marker, title_style);
    }
    let expander_x = geometry.physical_x(geometry.expander_x(row.depth), 1, panel_width);
    put(buf, area, expander_x, y, row.expander_glyph(), style::expander_style());

    let title_width = row.width.saturating_sub(row.text_x);
    let title_x = geometry.physical_x(row.text_x, title_width, panel_width);
    put(buf, area, title_x, y, &row.title, title_style);
}

fn put(buf: &mut Buffer, area: Rect, x: u32, y: u16, text: &str, style: Style) {
    let Ok(x) = u16::try_from(x) else {
        return;
    };
    if x >= area.width {
        return;
    }
    let max_width = usize::from(area.width - x);
    buf.set_stringn(area.x + x, y, text, max_width, style);
}

fn render_host(model: &Model, frame: &mut Frame, area: Rect) {
    let focused = model.focus == Pane::Host;
    let block = Block::default()
        .title("Node")
        .borders(Borders::ALL)
        .border_style(style::border_style(focused));

    let node = model.host_selected;
    let path = model
        .host_path()
        .iter()
        .filter_map(|id| model.source.text(*id))
        .map(crate::tree::display_title)
        .collect::<Vec<_>>()
        .join(" › ");
    let text = model.source.text(node).unwrap_or_default();
    let mut lines = text.lines();
    let heading = lines.next().unwrap_or_default();

    let mut content = Vec::new();
    if !path.is_empty() {
        content.push(Line::styled(path, style::host_path_style()));
        content.push(Line::raw(""));
    }
    content.push(Line::styled(heading.to_string(), style::host_heading_style()));
    content.extend(lines.map(|line| Line::raw(line.to_string())));
    let children = model.source.children(node).len();
    if children > 0 {
        content.push(Line::raw(""));
        content.push(Line::styled(
            format!("{children} child node{}", if children == 1 { "" } else { "s" }),
            style::host_path_style(),
        ));
    }

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

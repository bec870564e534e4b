//! Colors for the outline and host panes.
//!
//! Uses ANSI colors so the terminal's own palette decides the exact shades.

use ratatui::style::{Color, Modifier, Style};

/// Title style for a row `depth` levels below the displayed root.
pub fn row_style(depth: usize) -> Style {
    match depth {
        0 => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        1 => Style::default().fg(Color::Green),
        2 => Style::default().fg(Color::Yellow),
        3 => Style::default().fg(Color::Blue),
        4 => Style::default().fg(Color::Magenta),
        _ => Style::default(),
    }
}

pub fn expander_style() -> Style {
    Style::default().fg(Color::Indexed(245))
}

pub fn selected_style(base: Style, focused: bool) -> Style {
    if focused {
        base.reversed()
    } else {
        base.add_modifier(Modifier::UNDERLINED)
    }
}

/// Breadcrumb rows pinned above the scrolled rows.
pub fn breadcrumb_style(detached: bool) -> Style {
    let style = Style::default().bg(Color::Indexed(236)).fg(Color::White);
    if detached {
        style.add_modifier(Modifier::DIM | Modifier::ITALIC)
    } else {
        style.add_modifier(Modifier::BOLD)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

pub fn host_heading_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

pub fn host_path_style() -> Style {
    Style::default().fg(Color::Indexed(245))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_rows_are_bold() {
        assert!(row_style(0).add_modifier.contains(Modifier::BOLD));
        assert_eq!(row_style(9), Style::default());
    }

    #[test]
    fn test_selection_depends_on_focus() {
        let base = row_style(1);
        assert!(selected_style(base, true)
            .add_modifier
            .contains(Modifier::REVERSED));
        assert!(selected_style(base, false)
            .add_modifier
            .contains(Modifier::UNDERLINED));
    }
}

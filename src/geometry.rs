//! Row geometry derived from an injected configuration.
//!
//! All values are in abstract units. The terminal front end uses cells
//! (row height 1); a pixel renderer would pass font metrics instead.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Height of one line of title text.
    pub font_height: u32,
    /// Padding above and below the title inside a row.
    pub row_padding: u32,
    /// Horizontal indent per outline level.
    pub indent_width: u32,
    /// Width of the expand/collapse button.
    pub expander_width: u32,
    /// Width reserved in front of every row for the selection marker.
    pub marker_width: u32,
    /// Vertical inset of the content panel.
    pub content_origin_y: u32,
    pub text_direction: TextDirection,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self::terminal()
    }
}

impl GeometryConfig {
    /// One cell per row, two-cell indents.
    pub const fn terminal() -> Self {
        Self {
            font_height: 1,
            row_padding: 0,
            indent_width: 2,
            expander_width: 2,
            marker_width: 1,
            content_origin_y: 0,
            text_direction: TextDirection::LeftToRight,
        }
    }

    #[must_use]
    pub const fn with_text_direction(mut self, direction: TextDirection) -> Self {
        self.text_direction = direction;
        self
    }
}

/// Computed row metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    config: GeometryConfig,
    row_height: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(GeometryConfig::default())
    }
}

impl Geometry {
    pub fn new(config: GeometryConfig) -> Self {
        let row_height = (config.font_height + 2 * config.row_padding).max(1);
        Self { config, row_height }
    }

    pub const fn config(&self) -> &GeometryConfig {
        &self.config
    }

    pub const fn row_height(&self) -> u32 {
        self.row_height
    }

    pub const fn content_origin_y(&self) -> u32 {
        self.config.content_origin_y
    }

    pub const fn expander_width(&self) -> u32 {
        self.config.expander_width
    }

    pub const fn text_direction(&self) -> TextDirection {
        self.config.text_direction
    }

    pub const fn is_rtl(&self) -> bool {
        matches!(self.config.text_direction, TextDirection::RightToLeft)
    }

    /// Indent of a row at `depth` below the displayed root.
    pub fn indent(&self, depth: usize) -> u32 {
        let depth = u32::try_from(depth).unwrap_or(u32::MAX);
        self.config.indent_width.saturating_mul(depth)
    }

    /// Leading offset of the expander button, measured from the row's start edge.
    pub fn expander_x(&self, depth: usize) -> u32 {
        self.config.marker_width + self.indent(depth)
    }

    /// Leading offset of the title text, measured from the row's start edge.
    pub fn text_x(&self, depth: usize) -> u32 {
        self.expander_x(depth) + self.config.expander_width
    }

    /// Preferred width of a row whose title is `title_width` wide.
    pub fn row_width(&self, depth: usize, title_width: u32) -> u32 {
        self.text_x(depth).saturating_add(title_width)
    }

    /// Convert a leading-edge offset into a left-edge x for a panel of `panel_width`.
    pub const fn physical_x(&self, offset: u32, width: u32, panel_width: u32) -> u32 {
        if self.is_rtl() {
            panel_width.saturating_sub(offset.saturating_add(width))
        } else {
            offset
        }
    }

    pub const fn breadcrumb_height(&self, crumbs: usize) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let crumbs = crumbs as u32;
        crumbs.saturating_mul(self.row_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_geometry_has_unit_rows() {
        let geometry = Geometry::default();
        assert_eq!(geometry.row_height(), 1);
        assert_eq!(geometry.indent(3), 6);
        assert_eq!(geometry.text_x(0), 3);
        assert_eq!(geometry.row_width(1, 10), 15);
    }

    #[test]
    fn test_row_height_includes_padding() {
        let geometry = Geometry::new(GeometryConfig {
            font_height: 14,
            row_padding: 3,
            ..GeometryConfig::terminal()
        });
        assert_eq!(geometry.row_height(), 20);
        assert_eq!(geometry.breadcrumb_height(2), 40);
    }

    #[test]
    fn test_zero_font_height_still_yields_a_row() {
        let geometry = Geometry::new(GeometryConfig {
            font_height: 0,
            ..GeometryConfig::terminal()
        });
        assert_eq!(geometry.row_height(), 1);
    }

    #[test]
    fn test_rtl_mirrors_x() {
        let ltr = Geometry::default();
        let rtl = Geometry::new(GeometryConfig::terminal().with_text_direction(TextDirection::RightToLeft));
        assert_eq!(ltr.physical_x(3, 10, 40), 3);
        assert_eq!(rtl.physical_x(3, 10, 40), 27);
        assert!(rtl.is_rtl());
    }
}

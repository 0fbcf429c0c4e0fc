//! Text styles for the generated table of contents.
//!
//! Styles are selected per bookmark depth: an explicit `depth_N` entry wins, anything else
//! falls back to the default style. The heading of the TOC has its own entry.

use std::collections::BTreeMap;

use genpdf::style::{Color, Style};

/// Points per millimetre conversion factor (1 pt = 25.4 / 72 mm).
pub const MM_PER_PT: f64 = 25.4 / 72.0;

/// Immutable set of text attributes used by the layout and the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextStyle {
    font_size: u8,
    bold: bool,
    italic: bool,
    color: Option<(u8, u8, u8)>,
    bottom_margin_mm: u8,
}

impl TextStyle {
    /// Creates a regular style with the given font size in points.
    pub const fn new(font_size: u8) -> Self {
        Self {
            font_size,
            bold: false,
            italic: false,
            color: None,
            bottom_margin_mm: 0,
        }
    }

    /// Font size in points.
    pub fn font_size(&self) -> u8 {
        self.font_size
    }

    /// Font size converted to millimetres.
    pub fn font_size_mm(&self) -> f64 {
        f64::from(self.font_size) * MM_PER_PT
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    pub fn is_italic(&self) -> bool {
        self.italic
    }

    /// RGB color, if any.
    pub fn color(&self) -> Option<(u8, u8, u8)> {
        self.color
    }

    /// Vertical space added after a block rendered with this style, in millimetres.
    pub fn bottom_margin_mm(&self) -> f64 {
        f64::from(self.bottom_margin_mm)
    }

    /// Marks the style as bold and returns it.
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Marks the style as italic and returns it.
    pub const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Sets an RGB color and returns the style.
    pub const fn with_color(mut self, red: u8, green: u8, blue: u8) -> Self {
        self.color = Some((red, green, blue));
        self
    }

    /// Sets the spacing added after the block and returns the style.
    pub const fn with_bottom_margin_mm(mut self, margin: u8) -> Self {
        self.bottom_margin_mm = margin;
        self
    }

    /// Converts the attributes into a `genpdf` style using the document's default font family.
    pub fn to_genpdf(&self) -> Style {
        let mut style = Style::new().with_font_size(self.font_size);
        if self.bold {
            style.set_bold();
        }
        if self.italic {
            style.set_italic();
        }
        if let Some((r, g, b)) = self.color {
            style.set_color(Color::Rgb(r, g, b));
        }
        style
    }
}

/// Key of an entry in the [`StyleTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StyleKey {
    /// Heading of the table of contents.
    Title,
    /// Rows whose bookmark sits at the given nesting depth.
    Depth(u32),
    /// Fallback for depths without an explicit entry.
    Default,
}

/// Depth to style mapping with an explicit default fallback.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleTable {
    title: TextStyle,
    default: TextStyle,
    depths: BTreeMap<u32, TextStyle>,
}

impl StyleTable {
    /// Creates a table with only a title and a default style.
    pub fn new(title: TextStyle, default: TextStyle) -> Self {
        Self {
            title,
            default,
            depths: BTreeMap::new(),
        }
    }

    /// Adds a style for a specific depth and returns the table.
    pub fn with_depth(mut self, depth: u32, style: TextStyle) -> Self {
        self.depths.insert(depth, style);
        self
    }

    /// Returns the style stored under `key`, without fallback.
    pub fn get(&self, key: StyleKey) -> Option<&TextStyle> {
        match key {
            StyleKey::Title => Some(&self.title),
            StyleKey::Default => Some(&self.default),
            StyleKey::Depth(depth) => self.depths.get(&depth),
        }
    }

    /// Style of the TOC heading.
    pub fn title(&self) -> &TextStyle {
        &self.title
    }

    /// Resolves the style for a bookmark depth: `depth_N` if present, else the default.
    pub fn for_depth(&self, depth: u32) -> &TextStyle {
        self.get(StyleKey::Depth(depth)).unwrap_or(&self.default)
    }
}

impl Default for StyleTable {
    /// 18 pt bold blue title with 18 mm spacing, bold 12 pt top-level rows, regular 12 pt rows.
    fn default() -> Self {
        Self::new(
            TextStyle::new(18)
                .bold()
                .with_color(0, 0, 255)
                .with_bottom_margin_mm(18),
            TextStyle::new(12),
        )
        .with_depth(0, TextStyle::new(12).bold())
    }
}

#[cfg(test)]
mod tests {
    use super::{StyleKey, StyleTable, TextStyle};

    #[test]
    fn explicit_depth_wins_over_default() {
        let table = StyleTable::default();
        assert!(table.for_depth(0).is_bold());
        assert!(!table.for_depth(1).is_bold());
        assert_eq!(table.for_depth(7), table.get(StyleKey::Default).unwrap());
    }

    #[test]
    fn custom_depths_are_looked_up() {
        let table = StyleTable::new(TextStyle::new(20), TextStyle::new(10))
            .with_depth(2, TextStyle::new(9).italic());

        assert_eq!(table.for_depth(2).font_size(), 9);
        assert!(table.for_depth(2).is_italic());
        assert_eq!(table.for_depth(0).font_size(), 10);
        assert!(table.get(StyleKey::Depth(0)).is_none());
    }

    #[test]
    fn title_style_carries_spacing() {
        let table = StyleTable::default();
        assert_eq!(table.title().bottom_margin_mm(), 18.0);
        assert_eq!(table.title().color(), Some((0, 0, 255)));
    }
}

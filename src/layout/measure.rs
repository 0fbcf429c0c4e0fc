//! String width measurement used by the layout.

use genpdf::fonts::{FontCache, FontData, FontFamily};

use crate::elements::mm_to_f64;
use crate::style::TextStyle;

/// Measures rendered text widths in millimetres.
pub trait TextMeasure {
    /// Width of `text` when rendered with `style`.
    fn string_width(&self, style: &TextStyle, text: &str) -> f64;
}

/// Measurement backed by real glyph metrics from a `genpdf` font cache.
///
/// The cache is built from the same default font family the document is rendered with, so
/// styles without an explicit family resolve to identical fonts in both places.
pub struct FontMeasure {
    cache: FontCache,
}

impl FontMeasure {
    pub fn new(family: FontFamily<FontData>) -> Self {
        Self {
            cache: FontCache::new(family),
        }
    }

    /// Loads the default font family from [`crate::fonts`].
    pub fn with_default_fonts() -> Result<Self, genpdf::error::Error> {
        Ok(Self::new(crate::fonts::default_font_family()?))
    }
}

impl TextMeasure for FontMeasure {
    fn string_width(&self, style: &TextStyle, text: &str) -> f64 {
        mm_to_f64(style.to_genpdf().str_width(&self.cache, text))
    }
}

/// Fixed advance per character, proportional to the font size.
///
/// Layout with this measure is fully deterministic and needs no font files.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMeasure {
    /// Advance of one character as a fraction of the font size.
    pub advance: f64,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { advance: 0.5 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn string_width(&self, style: &TextStyle, text: &str) -> f64 {
        text.chars().count() as f64 * style.font_size_mm() * self.advance
    }
}

//! Custom `genpdf` elements used by the TOC renderer and the newspaper layout.
//!
//! `genpdf` ships flowing paragraphs and images but no absolute positioning, no justified text
//! and no multi-column flow. The elements in this module fill those gaps.

use std::path::Path;

use image::GenericImageView;
use log::warn;

use genpdf::elements::Image;
use genpdf::error::{Context as _, Error};
use genpdf::style::Style;
use genpdf::{render, Element, Mm, Position, RenderResult, Scale, Size};

use crate::layout::wrap::wrap_text;
use crate::layout::TextRun;

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;

/// Converts a plain millimetre value into `genpdf`'s opaque [`Mm`].
pub fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// Converts `genpdf`'s [`Mm`] back into a plain millimetre value.
pub fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn print_at(
    context: &genpdf::Context,
    area: &render::Area<'_>,
    style: Style,
    x: f64,
    y: f64,
    text: &str,
) -> Result<(), Error> {
    let position = Position::new(mm_from_f64(x), mm_from_f64(y));
    if !area.print_str(&context.font_cache, position, style, text)? {
        warn!("text '{}' at ({:.1}, {:.1}) does not fit the page area", text, x, y);
    }
    Ok(())
}

/// Prints `text` so that its words span exactly `target_width`, spreading the spare space
/// evenly between words.
fn print_justified(
    context: &genpdf::Context,
    area: &render::Area<'_>,
    style: Style,
    x: f64,
    y: f64,
    target_width: f64,
    text: &str,
) -> Result<(), Error> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 2 {
        return print_at(context, area, style, x, y, text);
    }

    let widths: Vec<f64> = words
        .iter()
        .map(|word| mm_to_f64(style.str_width(&context.font_cache, word)))
        .collect();
    let gap = (target_width - widths.iter().sum::<f64>()) / (words.len() - 1) as f64;

    let mut cursor = x;
    for (word, width) in words.iter().zip(widths) {
        print_at(context, area, style, cursor, y, word)?;
        cursor += width + gap;
    }
    Ok(())
}

/// Paints pre-positioned text runs, one layout page per rendered page.
///
/// Run coordinates are taken relative to the area handed to the element, so the document
/// should not add page margins of its own.
pub struct PlacedPages {
    pages: Vec<Vec<TextRun>>,
    next_page: usize,
}

impl PlacedPages {
    /// Groups `runs` by their page index; `page_count` pages are emitted even if some are empty.
    pub fn new(page_count: usize, runs: Vec<TextRun>) -> Self {
        let mut pages = vec![Vec::new(); page_count.max(1)];
        for run in runs {
            let index = run.page.min(pages.len() - 1);
            pages[index].push(run);
        }
        Self {
            pages,
            next_page: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn paint_run(
        context: &genpdf::Context,
        area: &render::Area<'_>,
        run: &TextRun,
    ) -> Result<(), Error> {
        let style = run.style.to_genpdf();
        let line_height = mm_to_f64(style.line_height(&context.font_cache));
        let top = run.y + (run.height - line_height) / 2.0;
        match run.justify_width {
            Some(target) => print_justified(context, area, style, run.x, top, target, &run.text),
            None => print_at(context, area, style, run.x, top, &run.text),
        }
    }
}

impl Element for PlacedPages {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let Some(runs) = self.pages.get(self.next_page) else {
            return Ok(result);
        };

        for run in runs {
            Self::paint_run(context, &area, run)?;
        }

        self.next_page += 1;
        result.size = area.size();
        result.has_more = self.next_page < self.pages.len();
        Ok(result)
    }
}

struct ColumnLine {
    text: String,
    justify: bool,
}

/// Justified text flowing from one column into the next, continuing on following pages.
pub struct TextColumns {
    text: String,
    columns: usize,
    gutter: f64,
    style: Style,
    lines: Option<Vec<ColumnLine>>,
    next_line: usize,
}

impl TextColumns {
    /// Creates a flow of `text` over `columns` columns separated by `gutter_mm`.
    ///
    /// Newlines separate paragraphs; the last line of each paragraph is left aligned.
    pub fn new(text: impl Into<String>, columns: usize, gutter_mm: f64) -> Self {
        Self {
            text: text.into(),
            columns: columns.max(1),
            gutter: gutter_mm,
            style: Style::new(),
            lines: None,
            next_line: 0,
        }
    }

    /// Sets the text style and returns the updated element.
    pub fn styled(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn column_width(&self, area_width: f64) -> f64 {
        let gutters = self.gutter * (self.columns - 1) as f64;
        ((area_width - gutters) / self.columns as f64).max(0.0)
    }

    fn wrap(&self, context: &genpdf::Context, style: Style, width: f64) -> Vec<ColumnLine> {
        let mut lines = Vec::new();
        for paragraph in self.text.split('\n') {
            let wrapped = wrap_text(paragraph, width, |candidate| {
                mm_to_f64(style.str_width(&context.font_cache, candidate))
            });
            let last = wrapped.len().saturating_sub(1);
            lines.extend(wrapped.into_iter().enumerate().map(|(index, text)| ColumnLine {
                text,
                justify: index < last,
            }));
        }
        lines
    }
}

impl Element for TextColumns {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let style = style.and(self.style);
        let size = area.size();
        let width = self.column_width(mm_to_f64(size.width));
        if self.lines.is_none() {
            self.lines = Some(self.wrap(context, style, width));
        }
        let lines = self.lines.as_deref().unwrap_or_default();

        let line_height = mm_to_f64(style.line_height(&context.font_cache));
        let rows = if line_height > 0.0 {
            (mm_to_f64(size.height) / line_height).floor() as usize
        } else {
            0
        };

        let mut used_rows = 0;
        for column in 0..self.columns {
            if self.next_line >= lines.len() {
                break;
            }
            let x = column as f64 * (width + self.gutter);
            let end = (self.next_line + rows).min(lines.len());
            for (row, line) in lines[self.next_line..end].iter().enumerate() {
                let y = row as f64 * line_height;
                if line.justify {
                    print_justified(context, &area, style, x, y, width, &line.text)?;
                } else if !line.text.is_empty() {
                    print_at(context, &area, style, x, y, &line.text)?;
                }
            }
            used_rows = used_rows.max(end - self.next_line);
            self.next_line = end;
        }

        let mut result = RenderResult::default();
        result.size = Size::new(size.width, mm_from_f64(used_rows as f64 * line_height));
        result.has_more = self.next_line < lines.len();
        Ok(result)
    }
}

/// Places elements next to each other, each taking a share of the available width.
///
/// Every column but the last gives up `gutter` millimetres on its right so the shares line up
/// with the full-width grid.
pub struct SideBySide {
    columns: Vec<(f64, Box<dyn Element>, bool)>,
    gutter: f64,
}

impl SideBySide {
    pub fn new(gutter_mm: f64) -> Self {
        Self {
            columns: Vec::new(),
            gutter: gutter_mm,
        }
    }

    /// Adds a column taking `share` (0..=1) of the width and returns the updated element.
    pub fn with_column<E: Element + 'static>(mut self, share: f64, element: E) -> Self {
        self.columns.push((share, Box::new(element), false));
        self
    }
}

impl Element for SideBySide {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let total_width = mm_to_f64(area.size().width);
        let last = self.columns.len().saturating_sub(1);
        let mut offset = 0.0;
        let mut height = 0.0_f64;
        let mut has_more = false;

        for (index, (share, element, done)) in self.columns.iter_mut().enumerate() {
            let slot = total_width * *share;
            let width = if index < last { slot - self.gutter } else { slot };
            if !*done {
                let mut column_area = area.clone();
                column_area.add_offset(Position::new(mm_from_f64(offset), 0));
                column_area.set_width(mm_from_f64(width.max(0.0)));
                let column_result = element.render(context, column_area, style)?;
                height = height.max(mm_to_f64(column_result.size.height));
                has_more |= column_result.has_more;
                *done = !column_result.has_more;
            }
            offset += slot;
        }

        let mut result = RenderResult::default();
        result.size = Size::new(area.size().width, mm_from_f64(height));
        result.has_more = has_more;
        Ok(result)
    }
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Loads an image from in-memory bytes using the [`image`] crate with descriptive errors.
pub fn decode_image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<image::DynamicImage, Error> {
    image::load_from_memory(bytes.as_ref()).context("Failed to decode image from provided bytes")
}

/// Loads an image from the given path using the [`image`] crate with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

/// An image scaled to the full width of the area it is rendered into, keeping its aspect ratio.
pub struct FullWidthImage {
    image: Image,
    natural_size: Size,
}

impl FullWidthImage {
    pub fn from_dynamic_image(image: image::DynamicImage) -> Result<Self, Error> {
        let natural_size = estimated_image_size(&image, DEFAULT_IMAGE_DPI);
        let image = Image::from_dynamic_image(image)?;
        Ok(Self {
            image,
            natural_size,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_dynamic_image(decode_image_from_path(path)?)
    }

    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, Error> {
        Self::from_dynamic_image(decode_image_from_bytes(bytes)?)
    }
}

impl Element for FullWidthImage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let natural = mm_to_f64(self.natural_size.width);
        if natural > f64::EPSILON {
            let scale = mm_to_f64(area.size().width) / natural;
            self.image.set_scale(Scale::new(scale, scale));
        }
        self.image.render(context, area, style)
    }
}

#[cfg(test)]
mod tests {
    use super::{mm_from_f64, mm_to_f64, PlacedPages};
    use crate::layout::TextRun;
    use crate::style::TextStyle;

    fn run(page: usize) -> TextRun {
        TextRun {
            page,
            x: 10.0,
            y: 10.0,
            width: 5.0,
            height: 6.0,
            text: "x".to_owned(),
            style: TextStyle::new(12),
            justify_width: None,
        }
    }

    #[test]
    fn millimetre_conversion_round_trips() {
        assert!((mm_to_f64(mm_from_f64(12.75)) - 12.75).abs() < 1e-9);
    }

    #[test]
    fn placed_pages_keep_empty_pages() {
        let pages = PlacedPages::new(3, vec![run(0), run(2), run(2)]);
        assert_eq!(pages.page_count(), 3);
        assert_eq!(pages.pages[1].len(), 0);
        assert_eq!(pages.pages[2].len(), 2);
    }
}

//! A page surface with a moving cursor, in the spirit of classic PDF "cell" APIs.

use log::debug;

use super::wrap::wrap_text;
use super::{Align, LinkRegion, NextX, NextY, PageGeometry, TextMeasure, TextRun};
use crate::style::TextStyle;

/// Cursor position in millimetres from the top-left corner of the current page.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Cursor {
    x: f64,
    y: f64,
}

/// Records positioned text and link regions across automatically broken pages.
pub struct Canvas<'m, M: TextMeasure + ?Sized> {
    measure: &'m M,
    geometry: PageGeometry,
    style: TextStyle,
    cursor: Cursor,
    page_count: usize,
    last_height: f64,
    runs: Vec<TextRun>,
    links: Vec<LinkRegion>,
}

impl<'m, M: TextMeasure + ?Sized> Canvas<'m, M> {
    /// Creates an empty canvas; call [`Canvas::add_page`] before writing.
    pub fn new(measure: &'m M, geometry: PageGeometry, style: TextStyle) -> Self {
        Self {
            measure,
            geometry,
            style,
            cursor: Cursor {
                x: geometry.left_margin,
                y: geometry.top_margin,
            },
            page_count: 0,
            last_height: 0.0,
            runs: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn set_style(&mut self, style: TextStyle) {
        self.style = style;
    }

    pub fn x(&self) -> f64 {
        self.cursor.x
    }

    pub fn y(&self) -> f64 {
        self.cursor.y
    }

    pub fn set_x(&mut self, x: f64) {
        self.cursor.x = x;
    }

    pub fn set_xy(&mut self, x: f64, y: f64) {
        self.cursor = Cursor { x, y };
    }

    /// Number of pages started so far.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Zero-based index of the page being written.
    pub fn current_page(&self) -> usize {
        self.page_count.saturating_sub(1)
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn links(&self) -> &[LinkRegion] {
        &self.links
    }

    /// Consumes the canvas, returning the page count, runs and link regions.
    pub fn finish(self) -> (usize, Vec<TextRun>, Vec<LinkRegion>) {
        (self.page_count, self.runs, self.links)
    }

    /// Width of `text` in the current style.
    pub fn string_width(&self, text: &str) -> f64 {
        self.measure.string_width(&self.style, text)
    }

    /// Starts a new page with the cursor at the top-left margin corner.
    pub fn add_page(&mut self) {
        self.page_count += 1;
        self.cursor = Cursor {
            x: self.geometry.left_margin,
            y: self.geometry.top_margin,
        };
    }

    /// Line break: x returns to the left margin and y advances by `height` or by the height of
    /// the last cell written.
    pub fn ln(&mut self, height: Option<f64>) {
        self.cursor.x = self.geometry.left_margin;
        self.cursor.y += height.unwrap_or(self.last_height);
    }

    /// Writes a single-line cell. A `width` of zero extends the cell to the right margin.
    #[allow(clippy::too_many_arguments)]
    pub fn cell(
        &mut self,
        width: f64,
        height: f64,
        text: &str,
        align: Align,
        next_x: NextX,
        next_y: NextY,
        link: Option<&str>,
    ) {
        let width = self.resolve_width(width);
        self.break_page_if_needed(height);
        let line = self.place_line(width, height, text, align, false, link);
        self.advance(line, width, height, next_x, next_y);
    }

    /// Writes text wrapped to `width`, one line per `height`. Only the last line honours
    /// `next_x`/`next_y`; the lines before it move the cursor down and back to the cell's start.
    #[allow(clippy::too_many_arguments)]
    pub fn multi_cell(
        &mut self,
        width: f64,
        height: f64,
        text: &str,
        align: Align,
        next_x: NextX,
        next_y: NextY,
        link: Option<&str>,
    ) {
        let width = self.resolve_width(width);
        let text_width = (width - 2.0 * self.geometry.cell_margin).max(0.0);
        let measure = self.measure;
        let style = self.style;
        let lines = wrap_text(text, text_width, |candidate| {
            measure.string_width(&style, candidate)
        });

        let start_x = self.cursor.x;
        let last = lines.len().saturating_sub(1);
        for (index, line) in lines.iter().enumerate() {
            self.break_page_if_needed(height);
            let justify = align == Align::Justify && index < last;
            let placed = self.place_line(width, height, line, align, justify, link);
            if index == last {
                self.advance(placed, width, height, next_x, next_y);
            } else {
                self.cursor.x = start_x;
                self.cursor.y += height;
                self.last_height = height;
            }
        }
    }

    fn resolve_width(&self, width: f64) -> f64 {
        if width == 0.0 {
            self.geometry.width - self.geometry.right_margin - self.cursor.x
        } else {
            width
        }
    }

    fn break_page_if_needed(&mut self, height: f64) {
        if self.page_count == 0 {
            self.add_page();
        }
        if self.cursor.y + height > self.geometry.page_break_trigger() {
            let x = self.cursor.x;
            debug!(
                "page break before y={:.2} (page {} full)",
                self.cursor.y,
                self.page_count
            );
            self.add_page();
            self.cursor.x = x;
        }
    }

    /// Records the text of one line and returns its (start, width).
    fn place_line(
        &mut self,
        width: f64,
        height: f64,
        text: &str,
        align: Align,
        justify: bool,
        link: Option<&str>,
    ) -> (f64, f64) {
        let margin = self.geometry.cell_margin;
        let text_width = self.string_width(text);
        let cell_x = self.cursor.x;
        let (start, painted_width, justify_width) = match align {
            Align::Left => (cell_x + margin, text_width, None),
            Align::Justify if justify && text.contains(' ') => {
                let target = width - 2.0 * margin;
                (cell_x + margin, target, Some(target))
            }
            Align::Justify => (cell_x + margin, text_width, None),
            Align::Right => (cell_x + width - margin - text_width, text_width, None),
            Align::Center => (cell_x + (width - text_width) / 2.0, text_width, None),
        };

        if !text.is_empty() {
            let page = self.current_page();
            self.runs.push(TextRun {
                page,
                x: start,
                y: self.cursor.y,
                width: text_width,
                height,
                text: text.to_owned(),
                style: self.style,
                justify_width,
            });
            if let Some(destination) = link {
                self.links.push(LinkRegion {
                    page,
                    x: start,
                    y: self.cursor.y,
                    width: painted_width,
                    height,
                    destination: destination.to_owned(),
                });
            }
        }

        (start, painted_width)
    }

    fn advance(&mut self, placed: (f64, f64), width: f64, height: f64, next_x: NextX, next_y: NextY) {
        let (start, painted_width) = placed;
        self.cursor.x = match next_x {
            NextX::Right => self.cursor.x + width,
            NextX::End => start + painted_width,
            NextX::LeftMargin => self.geometry.left_margin,
        };
        if next_y == NextY::Next {
            self.cursor.y += height;
        }
        self.last_height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::Canvas;
    use crate::layout::{Align, MonospaceMeasure, NextX, NextY, PageGeometry, TextMeasure};
    use crate::style::TextStyle;

    fn canvas(measure: &MonospaceMeasure) -> Canvas<'_, MonospaceMeasure> {
        let mut canvas = Canvas::new(measure, PageGeometry::a4(), TextStyle::new(12));
        canvas.add_page();
        canvas
    }

    #[test]
    fn cell_alignment_positions_text() {
        let measure = MonospaceMeasure::default();
        let mut canvas = canvas(&measure);
        let width = measure.string_width(&TextStyle::new(12), "abc");

        canvas.cell(100.0, 5.0, "abc", Align::Left, NextX::Right, NextY::Top, None);
        canvas.cell(50.0, 5.0, "abc", Align::Right, NextX::LeftMargin, NextY::Next, None);
        canvas.cell(0.0, 5.0, "abc", Align::Center, NextX::End, NextY::Top, None);

        let runs = canvas.runs();
        assert!((runs[0].x - 11.0).abs() < 1e-9);
        assert!((runs[1].x + width - (110.0 + 50.0 - 1.0)).abs() < 1e-9);
        assert!((runs[2].x - (10.0 + (190.0 - width) / 2.0)).abs() < 1e-9);
        assert!((canvas.y() - 15.0).abs() < 1e-9);
        assert!((canvas.x() - runs[2].right()).abs() < 1e-9);
    }

    #[test]
    fn multi_cell_wraps_and_justifies_all_but_last_line() {
        let measure = MonospaceMeasure::default();
        let mut canvas = canvas(&measure);
        let text = "word ".repeat(60);

        canvas.multi_cell(100.0, 6.0, &text, Align::Justify, NextX::End, NextY::Top, Some("d"));

        let runs = canvas.runs();
        assert!(runs.len() > 1);
        for run in &runs[..runs.len() - 1] {
            assert_eq!(run.justify_width, Some(98.0));
        }
        let last = runs.last().unwrap();
        assert_eq!(last.justify_width, None);
        assert!((canvas.y() - last.y).abs() < 1e-9);
        assert!((canvas.x() - (last.x + last.width)).abs() < 1e-9);
        assert_eq!(canvas.links().len(), runs.len());
    }

    #[test]
    fn page_breaks_keep_x() {
        let measure = MonospaceMeasure::default();
        let mut canvas = canvas(&measure);
        canvas.set_xy(42.0, 275.0);

        canvas.cell(20.0, 6.0, "x", Align::Left, NextX::Right, NextY::Next, None);

        assert_eq!(canvas.page_count(), 2);
        let run = &canvas.runs()[0];
        assert_eq!(run.page, 1);
        assert!((run.y - 10.0).abs() < 1e-9);
        assert!((run.x - 43.0).abs() < 1e-9);
    }

    #[test]
    fn ln_uses_last_cell_height() {
        let measure = MonospaceMeasure::default();
        let mut canvas = canvas(&measure);
        canvas.cell(10.0, 7.5, "a", Align::Left, NextX::Right, NextY::Top, None);
        canvas.ln(None);
        assert!((canvas.y() - 17.5).abs() < 1e-9);
        assert!((canvas.x() - 10.0).abs() < 1e-9);
        canvas.ln(Some(2.0));
        assert!((canvas.y() - 19.5).abs() < 1e-9);
    }
}

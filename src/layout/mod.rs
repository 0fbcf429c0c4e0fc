//! Cursor based page layout used to position the table of contents.
//!
//! The layout works in millimetres with the origin at the top-left corner of the page. It does
//! not write any PDF content itself: it records [`TextRun`]s and [`LinkRegion`]s that the
//! renderer in [`crate::elements`] paints and the merger in [`crate::merge`] turns into link
//! annotations.

pub mod canvas;
pub mod measure;
pub mod toc_line;
pub mod wrap;

pub use canvas::Canvas;
pub use measure::{FontMeasure, MonospaceMeasure, TextMeasure};
pub use toc_line::{render_toc_item, TocRow};

use crate::style::TextStyle;

/// Page size and margins, all in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub left_margin: f64,
    pub top_margin: f64,
    pub right_margin: f64,
    pub bottom_margin: f64,
    /// Horizontal padding between a cell's edge and its text.
    pub cell_margin: f64,
}

impl PageGeometry {
    /// A4 portrait with 10 mm side margins, a 20 mm bottom margin and a 1 mm cell margin.
    pub fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            left_margin: 10.0,
            top_margin: 10.0,
            right_margin: 10.0,
            bottom_margin: 20.0,
            cell_margin: 1.0,
        }
    }

    /// Width between the left and right margins.
    pub fn effective_width(&self) -> f64 {
        self.width - self.left_margin - self.right_margin
    }

    /// Lowest y a cell may reach before a page break is triggered.
    pub fn page_break_trigger(&self) -> f64 {
        self.height - self.bottom_margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// Horizontal alignment of text inside a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    /// Spread words to fill the cell; the last line of a block stays left aligned.
    Justify,
}

/// Where the cursor's x goes after a cell has been written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextX {
    /// Right edge of the cell.
    Right,
    /// Right after the end of the text.
    End,
    /// Back to the left margin.
    LeftMargin,
}

/// Where the cursor's y goes after a cell has been written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextY {
    /// Top of the (last) line that was written.
    Top,
    /// Below the last line that was written.
    Next,
}

/// A positioned piece of text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    /// Zero-based page index within the layout.
    pub page: usize,
    /// Left edge of the text.
    pub x: f64,
    /// Top edge of the cell containing the text.
    pub y: f64,
    /// Measured width of the text.
    pub width: f64,
    /// Height of the containing cell.
    pub height: f64,
    pub text: String,
    pub style: TextStyle,
    /// When set, words are spread so the line spans exactly this width.
    pub justify_width: Option<f64>,
}

impl TextRun {
    /// Right edge of the painted text.
    pub fn right(&self) -> f64 {
        self.x + self.justify_width.unwrap_or(self.width)
    }
}

/// A clickable area pointing at a named destination.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkRegion {
    pub page: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub destination: String,
}

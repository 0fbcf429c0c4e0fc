//! Layout of a single table of contents row: title, dot leader and page number.

use log::debug;

use super::{Align, Canvas, NextX, NextY, TextMeasure};
use crate::style::TextStyle;

/// Indentation added per bookmark depth, in millimetres.
pub const LEVEL_INDENT_MM: f64 = 7.5;

/// Row height as a multiple of the font size.
pub const LINE_SPACING: f64 = 1.5;

/// Default dot leader character.
pub const LEADER_CHAR: char = '.';

/// Everything the row layout needs to know about one entry.
#[derive(Clone, Debug, PartialEq)]
pub struct TocItem<'a> {
    pub title: &'a str,
    pub depth: u32,
    /// Printed page label, already shifted past the TOC pages and 1-based.
    pub page_label: String,
    /// Named destination every span of the row links to.
    pub link: String,
}

/// What the layout engine decided for one row.
#[derive(Clone, Debug, PartialEq)]
pub struct TocRow {
    pub title: String,
    pub depth: u32,
    pub page_label: String,
    pub link: String,
    /// The dot leader that was rendered, empty when none was.
    pub leader: String,
    /// Space the leader had to fit into (after the forced break, if one happened).
    pub available: f64,
    /// Whether the page number had to move to a line of its own.
    pub forced_break: bool,
}

/// Appends the longest run of `fill` whose width plus `clearance` stays below `available`.
///
/// The candidate grows one character at a time until it no longer fits; the last character
/// is then dropped. An empty string is returned when not even one character fits, or when
/// the fill character has no width.
pub fn fit_leader<F>(available: f64, clearance: f64, fill: char, width_of: F) -> String
where
    F: Fn(&str) -> f64,
{
    let mut buffer = [0; 4];
    let unit: &str = fill.encode_utf8(&mut buffer);
    let step = width_of(unit);
    if step <= 0.0 || available <= 0.0 {
        return String::new();
    }

    let max_len = (available / step).ceil() as usize + 1;
    let mut candidate = String::new();
    for _ in 0..=max_len {
        let candidate_width = width_of(&candidate) + clearance;
        if candidate_width >= available {
            break;
        }
        candidate.push(fill);
    }

    if candidate.chars().count() > 1 {
        candidate.pop();
        candidate
    } else {
        String::new()
    }
}

/// Renders one TOC row at the canvas cursor and leaves the cursor at the start of the next line.
///
/// The title is justified inside the indented width and may wrap. When the page number does
/// not fit after the title's last line, the row breaks and the leader restarts at the indented
/// margin. The fallback path does not subtract the clearance from the available space.
pub fn render_toc_item<M: TextMeasure + ?Sized>(
    canvas: &mut Canvas<'_, M>,
    style: TextStyle,
    item: &TocItem<'_>,
    fill: char,
) -> TocRow {
    canvas.set_style(style);
    let geometry = *canvas.geometry();
    let line_height = style.font_size_mm() * LINE_SPACING;
    let indent = f64::from(item.depth) * LEVEL_INDENT_MM;
    let link = Some(item.link.as_str());

    canvas.set_x(geometry.left_margin + indent);
    canvas.multi_cell(
        geometry.effective_width() - indent,
        line_height,
        item.title,
        Align::Justify,
        NextX::End,
        NextY::Top,
        link,
    );

    let clearance = geometry.cell_margin * 2.0;
    let label_width = canvas.string_width(&item.page_label);
    let mut current_x = canvas.x();
    let mut available = geometry.width - current_x - label_width - clearance - geometry.right_margin;
    let mut forced_break = false;

    if available < 0.0 {
        debug!(
            "no room for page label after '{}' (short by {:.2}mm), breaking line",
            item.title, -available
        );
        canvas.ln(None);
        canvas.set_x(geometry.left_margin + indent);
        current_x = canvas.x();
        available = geometry.width - current_x - label_width - geometry.right_margin;
        forced_break = true;
    }

    let mut leader = String::new();
    if available > 0.0 {
        leader = fit_leader(available, clearance, fill, |candidate| {
            canvas.string_width(candidate)
        });
        if !leader.is_empty() {
            canvas.multi_cell(
                geometry.width - current_x - geometry.right_margin,
                line_height,
                &leader,
                Align::Left,
                NextX::End,
                NextY::Top,
                link,
            );
        }
    }

    canvas.set_x(current_x);
    canvas.multi_cell(
        geometry.width - current_x - geometry.right_margin,
        line_height,
        &item.page_label,
        Align::Right,
        NextX::LeftMargin,
        NextY::Next,
        link,
    );

    TocRow {
        title: item.title.to_owned(),
        depth: item.depth,
        page_label: item.page_label.clone(),
        link: item.link.clone(),
        leader,
        available,
        forced_break,
    }
}

#[cfg(test)]
mod tests {
    use super::{fit_leader, render_toc_item, TocItem, LEVEL_INDENT_MM, LINE_SPACING};
    use crate::layout::{Canvas, MonospaceMeasure, PageGeometry, TextMeasure};
    use crate::style::TextStyle;

    fn item<'a>(title: &'a str, depth: u32, label: &str) -> TocItem<'a> {
        TocItem {
            title,
            depth,
            page_label: label.to_owned(),
            link: "dest3".to_owned(),
        }
    }

    #[test]
    fn leader_is_the_longest_fitting_run() {
        let width = |s: &str| s.chars().count() as f64 * 1.5;
        for available in [3.5, 10.0, 17.25, 40.0, 91.3] {
            let leader = fit_leader(available, 2.0, '.', width);
            if leader.is_empty() {
                continue;
            }
            assert!(width(&leader) + 2.0 < available);
            let longer = format!("{leader}.");
            assert!(width(&longer) + 2.0 >= available);
        }
    }

    #[test]
    fn candidate_of_one_dot_is_dropped() {
        let width = |s: &str| s.chars().count() as f64;
        // The empty candidate fits (0 + 1 < 1.5), "." does not: nothing is rendered.
        assert_eq!(fit_leader(1.5, 1.0, '.', width), "");
        // "." fits, ".." does not: trimming the overshoot leaves one dot.
        assert_eq!(fit_leader(2.5, 1.0, '.', width), ".");
        assert_eq!(fit_leader(3.5, 1.0, '.', width), "..");
        assert_eq!(fit_leader(-1.0, 1.0, '.', width), "");
    }

    #[test]
    fn zero_width_fill_does_not_loop() {
        assert_eq!(fit_leader(50.0, 1.0, '.', |_| 0.0), "");
    }

    #[test]
    fn short_title_gets_leader_and_right_aligned_label() {
        let measure = MonospaceMeasure::default();
        let style = TextStyle::new(12);
        let mut canvas = Canvas::new(&measure, PageGeometry::a4(), style);
        canvas.add_page();

        let row = render_toc_item(&mut canvas, style, &item("Introduction", 1, "7"), '.');

        assert!(!row.forced_break);
        let runs = canvas.runs();
        assert_eq!(runs.len(), 3);
        let (title, leader, label) = (&runs[0], &runs[1], &runs[2]);
        assert!((title.x - (10.0 + LEVEL_INDENT_MM + 1.0)).abs() < 1e-9);
        assert_eq!(leader.text, row.leader);
        assert!(leader.x > title.right());
        assert!(label.x > leader.right());
        assert!((label.right() - 199.0).abs() < 1e-9);
        assert!(measure.string_width(&style, &row.leader) + 2.0 < row.available);

        let line_height = style.font_size_mm() * LINE_SPACING;
        assert!((canvas.y() - (10.0 + line_height)).abs() < 1e-9);
        assert!((canvas.x() - 10.0).abs() < 1e-9);
        assert!(canvas.links().iter().all(|link| link.destination == "dest3"));
        assert_eq!(canvas.links().len(), 3);
    }

    #[test]
    fn long_title_forces_label_onto_next_line() {
        let measure = MonospaceMeasure::default();
        let style = TextStyle::new(12);
        let mut canvas = Canvas::new(&measure, PageGeometry::a4(), style);
        canvas.add_page();
        let title = "a".repeat(88);

        let row = render_toc_item(&mut canvas, style, &item(&title, 0, "6"), '.');

        assert!(row.forced_break);
        let runs = canvas.runs();
        assert_eq!(runs.len(), 3);
        let line_height = style.font_size_mm() * LINE_SPACING;
        let (title_run, leader, label) = (&runs[0], &runs[1], &runs[2]);
        assert!((leader.y - (title_run.y + line_height)).abs() < 1e-9);
        assert!((leader.x - 11.0).abs() < 1e-9);
        assert!((label.y - leader.y).abs() < 1e-9);
        assert!(label.x > leader.right());

        let label_width = measure.string_width(&style, "6");
        let expected_available = 210.0 - 10.0 - label_width - 10.0;
        assert!((row.available - expected_available).abs() < 1e-9);
        assert!(measure.string_width(&style, &row.leader) + 2.0 < row.available);
        assert!((canvas.y() - (title_run.y + 2.0 * line_height)).abs() < 1e-9);
    }
}

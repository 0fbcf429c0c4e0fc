//! Table of contents generation: planning, rendering and merging.
//!
//! A [`TocGenerator`] reads the bookmarks of a source document, lays out the TOC on a
//! [`Canvas`], paints the layout with `genpdf` and finally prepends the rendered pages to the
//! source with [`crate::merge`].

use std::fs;
use std::path::Path;

use genpdf::Size;
use log::{debug, info, warn};
use lopdf::Document;

use crate::builder::DocumentBuilder;
use crate::elements::{mm_from_f64, PlacedPages};
use crate::error::TocError;
use crate::fonts;
use crate::layout::toc_line::{TocItem, LEADER_CHAR};
use crate::layout::{
    render_toc_item, Align, Canvas, FontMeasure, LinkRegion, NextX, NextY, PageGeometry,
    TextMeasure, TextRun, TocRow,
};
use crate::merge::{prepend_toc, NamedDestination};
use crate::outline::{load_bookmarks, Bookmark};
use crate::style::StyleTable;

/// Heading printed at the top of the first TOC page.
pub const DEFAULT_TITLE: &str = "Table of Contents";

/// Number of leading outline entries dropped by default (cover, copyright and similar).
pub const DEFAULT_SKIP_BOOKMARKS: usize = 4;

/// Height of the heading cell in millimetres.
const TITLE_CELL_HEIGHT: f64 = 10.0;

/// Options controlling the generated TOC.
#[derive(Clone, Debug, PartialEq)]
pub struct TocOptions {
    pub title: String,
    pub styles: StyleTable,
    pub geometry: PageGeometry,
    /// Character repeated between a title and its page number.
    pub leader: char,
    pub skip_bookmarks: usize,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_owned(),
            styles: StyleTable::default(),
            geometry: PageGeometry::a4(),
            leader: LEADER_CHAR,
            skip_bookmarks: DEFAULT_SKIP_BOOKMARKS,
        }
    }
}

impl TocOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_styles(mut self, styles: StyleTable) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_leader(mut self, leader: char) -> Self {
        self.leader = leader;
        self
    }

    pub fn with_skip_bookmarks(mut self, skip: usize) -> Self {
        self.skip_bookmarks = skip;
        self
    }
}

/// A fully positioned TOC.
#[derive(Clone, Debug, PartialEq)]
pub struct TocLayout {
    pub page_count: usize,
    pub runs: Vec<TextRun>,
    pub links: Vec<LinkRegion>,
    pub rows: Vec<TocRow>,
}

/// Lays out the heading and one row per bookmark, printing page labels as if the TOC took
/// `assumed_pages` pages.
pub fn layout_toc<M: TextMeasure + ?Sized>(
    measure: &M,
    options: &TocOptions,
    bookmarks: &[Bookmark],
    assumed_pages: usize,
) -> TocLayout {
    let title_style = *options.styles.title();
    let mut canvas = Canvas::new(measure, options.geometry, title_style);
    canvas.add_page();

    canvas.cell(
        0.0,
        TITLE_CELL_HEIGHT,
        &options.title,
        Align::Center,
        NextX::Right,
        NextY::Top,
        None,
    );
    let spacing = title_style.bottom_margin_mm();
    if spacing > 0.0 {
        canvas.ln(Some(spacing));
    }

    let mut rows = Vec::with_capacity(bookmarks.len());
    for bookmark in bookmarks {
        let item = TocItem {
            title: &bookmark.title,
            depth: bookmark.depth,
            page_label: (bookmark.page + assumed_pages + 1).to_string(),
            link: bookmark.destination_name(),
        };
        let style = *options.styles.for_depth(bookmark.depth);
        rows.push(render_toc_item(&mut canvas, style, &item, options.leader));
    }

    let (page_count, runs, links) = canvas.finish();
    TocLayout {
        page_count,
        runs,
        links,
        rows,
    }
}

enum Planning {
    FirstPass,
    Corrected { measured: usize },
}

/// Lays out the TOC, repeating the layout once when the page count it assumed was wrong.
///
/// If the corrected layout still disagrees with its assumption the corrected layout is kept and
/// a warning is logged; links stay valid since they target page objects.
pub fn plan_toc<M: TextMeasure + ?Sized>(
    measure: &M,
    options: &TocOptions,
    bookmarks: &[Bookmark],
) -> TocLayout {
    let mut state = Planning::FirstPass;
    loop {
        match state {
            Planning::FirstPass => {
                let layout = layout_toc(measure, options, bookmarks, 1);
                if layout.page_count == 1 {
                    return layout;
                }
                debug!(
                    "TOC spans {} pages, laying out again with corrected labels",
                    layout.page_count
                );
                state = Planning::Corrected {
                    measured: layout.page_count,
                };
            }
            Planning::Corrected { measured } => {
                let layout = layout_toc(measure, options, bookmarks, measured);
                if layout.page_count != measured {
                    warn!(
                        "TOC page count still off after correction (assumed {}, got {}); page labels may be shifted",
                        measured, layout.page_count
                    );
                }
                return layout;
            }
        }
    }
}

/// Paints a planned TOC into a standalone PDF.
pub fn render_layout(
    options: &TocOptions,
    layout: &TocLayout,
    builder: DocumentBuilder,
) -> Result<Vec<u8>, TocError> {
    let geometry = options.geometry;
    let (mut document, counter) = builder
        .with_title(options.title.as_str())
        .with_paper_size(Size::new(
            mm_from_f64(geometry.width),
            mm_from_f64(geometry.height),
        ))
        .build()?;

    document.push(PlacedPages::new(layout.page_count, layout.runs.clone()));

    let mut buffer = Vec::new();
    document.render(&mut buffer)?;
    if counter.pages() != layout.page_count {
        warn!(
            "rendered {} TOC pages but the layout planned {}",
            counter.pages(),
            layout.page_count
        );
    }
    Ok(buffer)
}

/// One named destination per distinct bookmark page.
pub fn destinations_for(bookmarks: &[Bookmark]) -> Vec<NamedDestination> {
    let mut destinations: Vec<NamedDestination> = bookmarks
        .iter()
        .map(|bookmark| NamedDestination {
            name: bookmark.destination_name(),
            source_page: bookmark.page,
        })
        .collect();
    destinations.dedup();
    destinations
}

/// Result of a TOC generation run.
#[derive(Clone, Debug)]
pub struct GeneratedToc {
    /// The merged document.
    pub bytes: Vec<u8>,
    pub toc_pages: usize,
    /// Bookmarks that received a row, in row order.
    pub bookmarks: Vec<Bookmark>,
    pub rows: Vec<TocRow>,
}

/// Builds and prepends tables of contents.
#[derive(Clone, Debug, Default)]
pub struct TocGenerator {
    options: TocOptions,
}

impl TocGenerator {
    pub fn new(options: TocOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TocOptions {
        &self.options
    }

    /// Reads the selected bookmarks of `source` and plans their TOC with `measure`.
    pub fn plan<M: TextMeasure + ?Sized>(
        &self,
        source: &Document,
        measure: &M,
    ) -> Result<(Vec<Bookmark>, TocLayout), TocError> {
        let bookmarks = load_bookmarks(source, self.options.skip_bookmarks)?;
        debug!(
            "{} bookmarks selected after skipping {}",
            bookmarks.len(),
            self.options.skip_bookmarks
        );
        let layout = plan_toc(measure, &self.options, &bookmarks);
        Ok((bookmarks, layout))
    }

    /// Generates the TOC for `source_pdf` and returns the merged document.
    pub fn generate(&self, source_pdf: &[u8]) -> Result<GeneratedToc, TocError> {
        let mut source = Document::load_mem(source_pdf)?;

        let family = fonts::default_font_family()?;
        let measure = FontMeasure::new(family.clone());
        let (bookmarks, layout) = self.plan(&source, &measure)?;

        let toc_pdf = render_layout(
            &self.options,
            &layout,
            DocumentBuilder::new().with_font_family(family),
        )?;
        prepend_toc(
            &mut source,
            &toc_pdf,
            &layout.links,
            &destinations_for(&bookmarks),
        )?;

        let mut bytes = Vec::new();
        source.save_to(&mut bytes)?;
        info!(
            "generated a {}-page TOC with {} rows",
            layout.page_count,
            layout.rows.len()
        );

        Ok(GeneratedToc {
            bytes,
            toc_pages: layout.page_count,
            bookmarks,
            rows: layout.rows,
        })
    }

    /// Reads `source`, generates the TOC and writes the merged document to `destination`.
    pub fn generate_file(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<GeneratedToc, TocError> {
        let input = fs::read(source.as_ref())?;
        let generated = self.generate(&input)?;
        fs::write(destination.as_ref(), &generated.bytes)?;
        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use lopdf::Document;

    use super::{destinations_for, layout_toc, plan_toc, TocGenerator, TocOptions};
    use crate::layout::MonospaceMeasure;
    use crate::merge::prepend_toc;
    use crate::outline::{collect_name_tree, Bookmark};
    use crate::sample::{build_outlined_pdf, OutlineNode};

    fn sections(count: usize) -> Vec<Bookmark> {
        (0..count)
            .map(|index| Bookmark::new((index % 2) as u32, format!("Section {index}"), index))
            .collect()
    }

    #[test]
    fn heading_comes_first_and_rows_follow_its_spacing() {
        let layout = layout_toc(
            &MonospaceMeasure::default(),
            &TocOptions::default(),
            &sections(1),
            1,
        );
        assert_eq!(layout.runs[0].text, "Table of Contents");
        assert!(layout.links.iter().all(|link| link.y >= 28.0));
        assert_eq!(layout.rows.len(), 1);
        assert_eq!(layout.rows[0].page_label, "2");
    }

    #[test]
    fn single_page_toc_is_laid_out_once() {
        let layout = plan_toc(
            &MonospaceMeasure::default(),
            &TocOptions::default(),
            &sections(10),
        );
        assert_eq!(layout.page_count, 1);
        for (row, index) in layout.rows.iter().zip(0..) {
            assert_eq!(row.page_label, (index + 2).to_string());
        }
    }

    #[test]
    fn page_count_mismatch_relabels_every_row() {
        let bookmarks = sections(60);
        let layout = plan_toc(
            &MonospaceMeasure::default(),
            &TocOptions::default(),
            &bookmarks,
        );
        assert_eq!(layout.page_count, 2);
        for (row, bookmark) in layout.rows.iter().zip(&bookmarks) {
            assert_eq!(row.page_label, (bookmark.page + 3).to_string());
        }
        assert!(layout.runs.iter().any(|run| run.page == 1));
    }

    #[test]
    fn planning_is_deterministic() {
        let options = TocOptions::default();
        let measure = MonospaceMeasure::default();
        let bookmarks = sections(45);
        assert_eq!(
            plan_toc(&measure, &options, &bookmarks),
            plan_toc(&measure, &options, &bookmarks)
        );
    }

    #[test]
    fn duplicate_pages_share_one_destination() {
        let bookmarks = vec![
            Bookmark::new(0, "Chapter", 3),
            Bookmark::new(1, "Opening section", 3),
            Bookmark::new(0, "Next chapter", 5),
        ];
        let names: Vec<String> = destinations_for(&bookmarks)
            .into_iter()
            .map(|destination| destination.name)
            .collect();
        assert_eq!(names, ["dest3", "dest5"]);
    }

    #[test]
    fn five_entries_with_four_skipped_yield_one_linked_row() {
        let outline = vec![
            OutlineNode::new("Cover", 0),
            OutlineNode::new("Copyright", 1),
            OutlineNode::new("Dedication", 2),
            OutlineNode::new("Contents", 3),
            OutlineNode::new("Chapter 1", 4),
        ];
        let source_pdf = build_outlined_pdf(6, &outline).unwrap();
        let mut source = Document::load_mem(&source_pdf).unwrap();

        let generator = TocGenerator::new(TocOptions::default());
        let (bookmarks, layout) = generator
            .plan(&source, &MonospaceMeasure::default())
            .unwrap();
        assert_eq!(layout.rows.len(), 1);
        assert_eq!(layout.rows[0].title, "Chapter 1");
        assert_eq!(layout.rows[0].page_label, "6");
        assert!(layout.links.iter().all(|link| link.destination == "dest4"));

        let toc_pdf = build_outlined_pdf(layout.page_count, &[]).unwrap();
        prepend_toc(
            &mut source,
            &toc_pdf,
            &layout.links,
            &destinations_for(&bookmarks),
        )
        .unwrap();

        let pages = source.get_pages();
        assert_eq!(pages.len(), 7);
        let catalog = crate::outline::catalog(&source).unwrap();
        let names = catalog.get(b"Names").unwrap().as_dict().unwrap();
        let tree = source
            .get_object(names.get(b"Dests").unwrap().as_reference().unwrap())
            .unwrap()
            .as_dict()
            .unwrap();
        let mut entries = std::collections::BTreeMap::new();
        collect_name_tree(&source, tree, 0, &mut entries);
        let target = entries[b"dest4".as_slice()].as_array().unwrap()[0]
            .as_reference()
            .unwrap();
        // Page 5 of the source is page 6 of the merged document.
        assert_eq!(target, pages[&6]);
    }
}

//! Generation of small outlined PDFs with `lopdf`.
//!
//! The documents are intentionally plain: one line of Helvetica text per page and a nested
//! `/Outlines` tree whose entries point at pages through `/Dest [page /Fit]` arrays. They serve as
//! input for the TOC demo and as fixtures for the tests, without requiring any font files.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::TocError;

/// A4 page size in PDF points.
const PAGE_WIDTH_PT: i64 = 595;
const PAGE_HEIGHT_PT: i64 = 842;

/// One entry of the outline tree to embed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineNode {
    title: String,
    page: usize,
    children: Vec<OutlineNode>,
}

impl OutlineNode {
    /// Creates an entry targeting the zero-based `page`.
    pub fn new(title: impl Into<String>, page: usize) -> Self {
        Self {
            title: title.into(),
            page,
            children: Vec::new(),
        }
    }

    /// Appends a nested entry and returns the updated node.
    pub fn with_child(mut self, child: OutlineNode) -> Self {
        self.children.push(child);
        self
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(OutlineNode::count).sum::<usize>()
    }
}

/// Outline of the bundled sample book: four front-matter entries followed by chapters.
pub fn sample_outline() -> Vec<OutlineNode> {
    vec![
        OutlineNode::new("Cover", 0),
        OutlineNode::new("Copyright", 1),
        OutlineNode::new("Dedication", 2),
        OutlineNode::new("Contents", 3),
        OutlineNode::new("Chapter 1: Getting Started", 4)
            .with_child(OutlineNode::new("Installing the toolchain", 4))
            .with_child(OutlineNode::new("A first document", 5)),
        OutlineNode::new("Chapter 2: Working with Outlines", 6)
            .with_child(
                OutlineNode::new("Reading bookmarks", 6).with_child(OutlineNode::new(
                    "Named destinations and GoTo actions found in documents produced by \
                     older office suites",
                    7,
                )),
            )
            .with_child(OutlineNode::new("Flattening the tree", 8)),
        OutlineNode::new("Chapter 3: Layout", 9),
        OutlineNode::new("Appendix", 11),
    ]
}

/// Number of pages the sample book needs.
pub const SAMPLE_PAGE_COUNT: usize = 12;

/// Builds the sample book.
pub fn build_sample_pdf() -> Result<Vec<u8>, TocError> {
    build_outlined_pdf(SAMPLE_PAGE_COUNT, &sample_outline())
}

/// Builds a `page_count`-page PDF carrying `outline` as its bookmark tree.
///
/// Entries pointing past the last page are clamped to it.
pub fn build_outlined_pdf(page_count: usize, outline: &[OutlineNode]) -> Result<Vec<u8>, TocError> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    let font_id = document.add_object(Object::Dictionary(font));

    let page_count = page_count.max(1);
    let mut page_ids = Vec::with_capacity(page_count);
    for index in 0..page_count {
        page_ids.push(add_page(&mut document, pages_id, font_id, index));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set(
        "Kids",
        Object::Array(page_ids.iter().copied().map(Object::Reference).collect()),
    );
    pages.set("Count", Object::Integer(page_ids.len() as i64));
    pages.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH_PT),
            Object::Integer(PAGE_HEIGHT_PT),
        ]),
    );
    document
        .objects
        .insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    if !outline.is_empty() {
        let outlines_id = document.new_object_id();
        let (first, last) = insert_outline_level(&mut document, outlines_id, outline, &page_ids);

        let mut root = Dictionary::new();
        root.set("Type", Object::Name(b"Outlines".to_vec()));
        root.set(
            "Count",
            Object::Integer(outline.iter().map(OutlineNode::count).sum::<usize>() as i64),
        );
        root.set("First", Object::Reference(first));
        root.set("Last", Object::Reference(last));
        document
            .objects
            .insert(outlines_id, Object::Dictionary(root));
        catalog.set("Outlines", Object::Reference(outlines_id));
        catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));
    }

    let catalog_id = document.add_object(Object::Dictionary(catalog));
    document.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

fn add_page(
    document: &mut Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    index: usize,
) -> ObjectId {
    let content = format!("BT /F1 24 Tf 72 760 Td (Page {}) Tj ET", index + 1);
    let content_id = document.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set("Contents", Object::Reference(content_id));
    page.set("Resources", Object::Dictionary(resources));
    document.add_object(Object::Dictionary(page))
}

/// Inserts one sibling level of the outline and returns the ids of its first and last entries.
fn insert_outline_level(
    document: &mut Document,
    parent: ObjectId,
    nodes: &[OutlineNode],
    page_ids: &[ObjectId],
) -> (ObjectId, ObjectId) {
    let ids: Vec<ObjectId> = nodes.iter().map(|_| document.new_object_id()).collect();

    for (index, node) in nodes.iter().enumerate() {
        let page_ref = page_ids[node.page.min(page_ids.len() - 1)];

        let mut dictionary = Dictionary::new();
        dictionary.set("Title", Object::string_literal(node.title.as_str()));
        dictionary.set(
            "Dest",
            Object::Array(vec![Object::Reference(page_ref), Object::Name(b"Fit".to_vec())]),
        );
        dictionary.set("Parent", Object::Reference(parent));

        if index > 0 {
            dictionary.set("Prev", Object::Reference(ids[index - 1]));
        }
        if index + 1 < ids.len() {
            dictionary.set("Next", Object::Reference(ids[index + 1]));
        }

        if !node.children.is_empty() {
            let (first, last) = insert_outline_level(document, ids[index], &node.children, page_ids);
            dictionary.set("First", Object::Reference(first));
            dictionary.set("Last", Object::Reference(last));
            dictionary.set("Count", Object::Integer((node.count() - 1) as i64));
        }

        document
            .objects
            .insert(ids[index], Object::Dictionary(dictionary));
    }

    (ids[0], ids[ids.len() - 1])
}

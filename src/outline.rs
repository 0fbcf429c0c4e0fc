//! Reading the bookmark outline of an existing PDF with `lopdf`.
//!
//! The `/Outlines` tree is walked depth first through its `/First` and `/Next` links. Each entry's
//! destination is resolved to a zero-based page index, whether it is given directly (`/Dest`
//! array), through a GoTo action (`/A`), or by name (the `/Names /Dests` tree or the legacy
//! `/Dests` dictionary).

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, warn};
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::TocError;

const MAX_OUTLINE_DEPTH: u32 = 64;
const MAX_NAME_TREE_DEPTH: usize = 32;

/// A flattened outline entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bookmark {
    /// Nesting level, zero for top-level entries.
    pub depth: u32,
    pub title: String,
    /// Zero-based index of the target page.
    pub page: usize,
}

impl Bookmark {
    pub fn new(depth: u32, title: impl Into<String>, page: usize) -> Self {
        Self {
            depth,
            title: title.into(),
            page,
        }
    }

    /// Name of the destination a TOC row for this bookmark links to.
    pub fn destination_name(&self) -> String {
        format!("dest{}", self.page)
    }
}

/// An outline entry as found in the document, whether or not its target page is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineEntry {
    pub depth: u32,
    pub title: String,
    /// Zero-based target page, `None` when the destination does not resolve to a page.
    pub page: Option<usize>,
}

impl OutlineEntry {
    /// Converts the entry into a bookmark, logging and dropping it when it has no page.
    fn into_bookmark(self) -> Option<Bookmark> {
        match self.page {
            Some(page) => Some(Bookmark {
                depth: self.depth,
                title: self.title,
                page,
            }),
            None => {
                warn!("outline entry '{}' has no resolvable page, skipping it", self.title);
                None
            }
        }
    }
}

impl From<Bookmark> for OutlineEntry {
    fn from(bookmark: Bookmark) -> Self {
        Self {
            depth: bookmark.depth,
            title: bookmark.title,
            page: Some(bookmark.page),
        }
    }
}

/// Flattens the document outline in reading order, keeping entries without a page.
///
/// A document without an outline yields an empty list.
pub fn flatten_outline(document: &Document) -> Result<Vec<OutlineEntry>, TocError> {
    let catalog = catalog(document)?;

    let Some(outlines) = catalog
        .get(b"Outlines")
        .ok()
        .and_then(|object| resolve(document, object))
        .and_then(|object| object.as_dict().ok())
    else {
        debug!("document has no outline");
        return Ok(Vec::new());
    };

    let Ok(first) = outlines.get(b"First").and_then(Object::as_reference) else {
        return Ok(Vec::new());
    };

    let resolver = DestinationResolver::new(document, catalog);
    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    walk_outline(document, &resolver, first, 0, &mut visited, &mut entries);
    Ok(entries)
}

/// Flattens the document outline in reading order.
///
/// Entries whose destination does not resolve to a page of `document` are skipped with a
/// warning.
pub fn extract_bookmarks(document: &Document) -> Result<Vec<Bookmark>, TocError> {
    Ok(flatten_outline(document)?
        .into_iter()
        .filter_map(OutlineEntry::into_bookmark)
        .collect())
}

/// Drops the first `skip` outline entries, then the entries without a page, and orders the
/// rest by target page.
///
/// The skip counts every entry, resolvable or not. The sort is stable, so entries pointing at
/// the same page keep their outline order.
pub fn select_bookmarks(entries: Vec<OutlineEntry>, skip: usize) -> Vec<Bookmark> {
    let mut selected: Vec<Bookmark> = entries
        .into_iter()
        .skip(skip)
        .filter_map(OutlineEntry::into_bookmark)
        .collect();
    selected.sort_by_key(|bookmark| bookmark.page);
    selected
}

/// Reads, skips and sorts the bookmarks of `document` in one go.
pub fn load_bookmarks(document: &Document, skip: usize) -> Result<Vec<Bookmark>, TocError> {
    Ok(select_bookmarks(flatten_outline(document)?, skip))
}

/// Decodes a PDF text string: UTF-16BE with a byte order mark, UTF-8 with a byte order mark,
/// otherwise single-byte text.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

pub(crate) fn catalog(document: &Document) -> Result<&Dictionary, TocError> {
    let root = document
        .trailer
        .get(b"Root")
        .map_err(|_| TocError::MissingCatalog)?;
    resolve(document, root)
        .ok_or(TocError::MissingCatalog)?
        .as_dict()
        .map_err(|_| TocError::InvalidCatalog)
}

/// Follows a reference, if `object` is one.
pub(crate) fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn walk_outline(
    document: &Document,
    resolver: &DestinationResolver<'_>,
    first: ObjectId,
    depth: u32,
    visited: &mut HashSet<ObjectId>,
    entries: &mut Vec<OutlineEntry>,
) {
    if depth >= MAX_OUTLINE_DEPTH {
        warn!("outline nested deeper than {} levels, ignoring the rest", MAX_OUTLINE_DEPTH);
        return;
    }

    let mut current = Some(first);
    while let Some(node_id) = current {
        if !visited.insert(node_id) {
            warn!("outline item {:?} visited twice, stopping at the cycle", node_id);
            break;
        }

        let Some(node) = document
            .get_object(node_id)
            .ok()
            .and_then(|object| object.as_dict().ok())
        else {
            break;
        };

        let title = node
            .get(b"Title")
            .ok()
            .and_then(|object| resolve(document, object))
            .and_then(|object| object.as_str().ok())
            .map(decode_text_string)
            .unwrap_or_default();

        entries.push(OutlineEntry {
            depth,
            title,
            page: resolver.page_of_item(node),
        });

        if let Ok(child) = node.get(b"First").and_then(Object::as_reference) {
            walk_outline(document, resolver, child, depth + 1, visited, entries);
        }

        current = node.get(b"Next").and_then(Object::as_reference).ok();
    }
}

struct DestinationResolver<'a> {
    document: &'a Document,
    page_indices: HashMap<ObjectId, usize>,
    named: BTreeMap<Vec<u8>, &'a Object>,
}

impl<'a> DestinationResolver<'a> {
    fn new(document: &'a Document, catalog: &'a Dictionary) -> Self {
        let page_indices = document
            .get_pages()
            .into_iter()
            .map(|(number, id)| (id, number as usize - 1))
            .collect();

        let mut named = BTreeMap::new();
        if let Some(dests) = catalog
            .get(b"Dests")
            .ok()
            .and_then(|object| resolve(document, object))
            .and_then(|object| object.as_dict().ok())
        {
            for (key, value) in dests.iter() {
                named.insert(key.clone(), value);
            }
        }
        if let Some(tree) = catalog
            .get(b"Names")
            .ok()
            .and_then(|object| resolve(document, object))
            .and_then(|object| object.as_dict().ok())
            .and_then(|names| names.get(b"Dests").ok())
            .and_then(|object| resolve(document, object))
            .and_then(|object| object.as_dict().ok())
        {
            collect_name_tree(document, tree, 0, &mut named);
        }

        Self {
            document,
            page_indices,
            named,
        }
    }

    fn page_of_item(&self, item: &Dictionary) -> Option<usize> {
        if let Ok(dest) = item.get(b"Dest") {
            return self.page_of_destination(dest, 0);
        }

        let action = resolve(self.document, item.get(b"A").ok()?)?.as_dict().ok()?;
        if action.get(b"S").and_then(Object::as_name).ok()? != b"GoTo" {
            return None;
        }
        self.page_of_destination(action.get(b"D").ok()?, 0)
    }

    fn page_of_destination(&self, destination: &Object, hops: usize) -> Option<usize> {
        if hops > 4 {
            return None;
        }
        match resolve(self.document, destination)? {
            Object::Array(items) => {
                let page = items.first()?.as_reference().ok()?;
                self.page_indices.get(&page).copied()
            }
            Object::String(name, _) | Object::Name(name) => {
                let target = self.named.get(name.as_slice())?;
                self.page_of_destination(target, hops + 1)
            }
            Object::Dictionary(entry) => self.page_of_destination(entry.get(b"D").ok()?, hops + 1),
            _ => None,
        }
    }
}

/// Collects every key/value pair of a name tree, recursing through `/Kids`.
pub(crate) fn collect_name_tree<'a>(
    document: &'a Document,
    node: &'a Dictionary,
    depth: usize,
    entries: &mut BTreeMap<Vec<u8>, &'a Object>,
) {
    if depth > MAX_NAME_TREE_DEPTH {
        return;
    }

    if let Some(names) = node
        .get(b"Names")
        .ok()
        .and_then(|object| resolve(document, object))
        .and_then(|object| object.as_array().ok())
    {
        for pair in names.chunks_exact(2) {
            if let Some(Object::String(key, _)) = resolve(document, &pair[0]) {
                entries.insert(key.clone(), &pair[1]);
            }
        }
    }

    if let Some(kids) = node
        .get(b"Kids")
        .ok()
        .and_then(|object| resolve(document, object))
        .and_then(|object| object.as_array().ok())
    {
        for kid in kids {
            if let Some(child) = resolve(document, kid).and_then(|object| object.as_dict().ok()) {
                collect_name_tree(document, child, depth + 1, entries);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{Dictionary, Document, Object};

    use super::{
        decode_text_string, extract_bookmarks, flatten_outline, load_bookmarks, select_bookmarks,
        Bookmark, OutlineEntry,
    };
    use crate::sample::{build_outlined_pdf, OutlineNode};

    fn sample_document() -> Document {
        let outline = vec![
            OutlineNode::new("Cover", 0),
            OutlineNode::new("Chapter 1", 1)
                .with_child(OutlineNode::new("Section 1.1", 1))
                .with_child(OutlineNode::new("Section 1.2", 2)),
            OutlineNode::new("Chapter 2", 3),
        ];
        let bytes = build_outlined_pdf(4, &outline).expect("sample pdf");
        Document::load_mem(&bytes).expect("load sample")
    }

    #[test]
    fn flattens_outline_with_depths() {
        let bookmarks = extract_bookmarks(&sample_document()).unwrap();
        assert_eq!(
            bookmarks,
            vec![
                Bookmark::new(0, "Cover", 0),
                Bookmark::new(0, "Chapter 1", 1),
                Bookmark::new(1, "Section 1.1", 1),
                Bookmark::new(1, "Section 1.2", 2),
                Bookmark::new(0, "Chapter 2", 3),
            ]
        );
    }

    fn entries(bookmarks: &[Bookmark]) -> Vec<OutlineEntry> {
        bookmarks.iter().cloned().map(OutlineEntry::from).collect()
    }

    #[test]
    fn skipping_drops_exact_prefix_and_keeps_fields() {
        let bookmarks = vec![
            Bookmark::new(0, "a", 0),
            Bookmark::new(1, "b", 1),
            Bookmark::new(0, "c", 2),
            Bookmark::new(2, "d", 5),
            Bookmark::new(1, "e", 9),
        ];
        let selected = select_bookmarks(entries(&bookmarks), 2);
        assert_eq!(selected, bookmarks[2..].to_vec());
        assert!(select_bookmarks(entries(&bookmarks), 10).is_empty());
    }

    #[test]
    fn selection_sorts_by_page_stably() {
        let selected = select_bookmarks(
            entries(&[
                Bookmark::new(0, "skip", 0),
                Bookmark::new(0, "late", 7),
                Bookmark::new(1, "early", 2),
                Bookmark::new(1, "also early", 2),
            ]),
            1,
        );
        let titles: Vec<_> = selected.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["early", "also early", "late"]);
    }

    #[test]
    fn unresolved_entries_count_towards_the_skip() {
        let outline = vec![
            OutlineNode::new("Cover", 0),
            OutlineNode::new("Copyright", 1),
            OutlineNode::new("Dedication", 2),
            OutlineNode::new("Contents", 3),
            OutlineNode::new("Chapter 1", 4),
        ];
        let bytes = build_outlined_pdf(5, &outline).unwrap();
        let mut document = Document::load_mem(&bytes).unwrap();

        let catalog_id = document.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let outline_id = document
            .get_dictionary(catalog_id)
            .unwrap()
            .get(b"Outlines")
            .unwrap()
            .as_reference()
            .unwrap();
        let cover_id = document
            .get_dictionary(outline_id)
            .unwrap()
            .get(b"First")
            .unwrap()
            .as_reference()
            .unwrap();

        let mut action = Dictionary::new();
        action.set("S", Object::Name(b"URI".to_vec()));
        action.set("URI", Object::string_literal("https://example.com"));
        let cover = document
            .get_object_mut(cover_id)
            .and_then(Object::as_dict_mut)
            .unwrap();
        cover.remove(b"Dest");
        cover.set("A", Object::Dictionary(action));

        let flattened = flatten_outline(&document).unwrap();
        assert_eq!(flattened.len(), 5);
        assert_eq!(flattened[0].page, None);

        let selected = load_bookmarks(&document, 4).unwrap();
        assert_eq!(selected, vec![Bookmark::new(0, "Chapter 1", 4)]);
        assert_eq!(extract_bookmarks(&document).unwrap().len(), 4);
    }

    #[test]
    fn unresolved_entries_after_the_skip_are_dropped() {
        let mut listed = entries(&[
            Bookmark::new(0, "Cover", 0),
            Bookmark::new(0, "Chapter 1", 3),
            Bookmark::new(0, "Chapter 2", 6),
        ]);
        listed[1].page = None;
        let selected = select_bookmarks(listed, 1);
        assert_eq!(selected, vec![Bookmark::new(0, "Chapter 2", 6)]);
    }

    #[test]
    fn resolves_named_and_action_destinations() {
        let mut document = sample_document();
        let pages = document.get_pages();
        let third_page = pages[&3];

        let mut names = Dictionary::new();
        names.set(
            "Names",
            Object::Array(vec![
                Object::string_literal("chapter-two"),
                Object::Array(vec![Object::Reference(third_page), Object::Name(b"Fit".to_vec())]),
            ]),
        );
        let tree_id = document.add_object(Object::Dictionary(names));
        let mut names_root = Dictionary::new();
        names_root.set("Dests", Object::Reference(tree_id));

        let catalog_id = document.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let outline_id = {
            let catalog = document
                .get_object_mut(catalog_id)
                .and_then(Object::as_dict_mut)
                .unwrap();
            catalog.set("Names", Object::Dictionary(names_root));
            catalog.get(b"Outlines").unwrap().as_reference().unwrap()
        };
        let first_id = document
            .get_dictionary(outline_id)
            .unwrap()
            .get(b"First")
            .unwrap()
            .as_reference()
            .unwrap();

        let mut action = Dictionary::new();
        action.set("S", Object::Name(b"GoTo".to_vec()));
        action.set("D", Object::string_literal("chapter-two"));
        let first = document
            .get_object_mut(first_id)
            .and_then(Object::as_dict_mut)
            .unwrap();
        first.remove(b"Dest");
        first.set("A", Object::Dictionary(action));

        let bookmarks = extract_bookmarks(&document).unwrap();
        assert_eq!(bookmarks[0], Bookmark::new(0, "Cover", 2));
    }

    #[test]
    fn decodes_utf16_titles() {
        let bytes = [0xFE, 0xFF, 0x00, 0x43, 0x00, 0xE9];
        assert_eq!(decode_text_string(&bytes), "Cé");
        assert_eq!(decode_text_string(b"Plain"), "Plain");
        assert_eq!(decode_text_string(&[0x43, 0xE9]), "Cé");
    }

    #[test]
    fn document_without_outline_has_no_bookmarks() {
        let bytes = build_outlined_pdf(2, &[]).unwrap();
        let document = Document::load_mem(&bytes).unwrap();
        assert!(extract_bookmarks(&document).unwrap().is_empty());
    }
}

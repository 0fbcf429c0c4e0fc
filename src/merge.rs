//! Prepending generated TOC pages to a source document with `lopdf`.
//!
//! The source document stays the base of the merge so that its catalog, outline and existing
//! destinations survive untouched. The TOC's objects are renumbered above the source's highest
//! object id, its pages are re-parented in front of the source pages, and every TOC row gets a
//! `/Link` annotation pointing at a named destination in the `/Names /Dests` tree.

use std::collections::BTreeMap;

use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::TocError;
use crate::layout::LinkRegion;
use crate::outline::{collect_name_tree, resolve};

/// PDF points per millimetre.
const PT_PER_MM: f64 = 72.0 / 25.4;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// A destination to register in the merged document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedDestination {
    pub name: String,
    /// Zero-based page index in the source document.
    pub source_page: usize,
}

/// Summary of a finished merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeReport {
    pub toc_pages: usize,
    pub source_pages: usize,
    pub destinations: usize,
    pub links: usize,
}

/// Puts the pages of `toc_pdf` in front of `source`, registers `destinations`, and turns
/// `links` (page indices relative to the TOC) into link annotations.
pub fn prepend_toc(
    source: &mut Document,
    toc_pdf: &[u8],
    links: &[LinkRegion],
    destinations: &[NamedDestination],
) -> Result<MergeReport, TocError> {
    let source_page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
    let pages_root = pages_root_id(source)?;

    let mut toc = Document::load_mem(toc_pdf)?;
    toc.renumber_objects_with(source.max_id + 1);
    let toc_page_ids: Vec<ObjectId> = toc.get_pages().into_values().collect();
    let skipped = structural_object_ids(&toc)?;

    let mut flattened_pages = Vec::with_capacity(toc_page_ids.len());
    for page_id in &toc_page_ids {
        flattened_pages.push((*page_id, flattened_page(&toc, *page_id)?));
    }

    source.max_id = source.max_id.max(toc.max_id);
    for (id, object) in toc.objects {
        if !skipped.contains(&id) && !toc_page_ids.contains(&id) {
            source.objects.insert(id, object);
        }
    }

    let mut link_count = 0;
    for (index, (page_id, mut page)) in flattened_pages.into_iter().enumerate() {
        let page_height = media_box_height(source, &page);
        let mut annotations = match page.get(b"Annots") {
            Ok(Object::Array(existing)) => existing.clone(),
            _ => Vec::new(),
        };
        for link in links.iter().filter(|link| link.page == index) {
            let annotation = link_annotation(link, page_height);
            annotations.push(Object::Reference(source.add_object(annotation)));
            link_count += 1;
        }
        if !annotations.is_empty() {
            page.set("Annots", Object::Array(annotations));
        }
        page.set("Parent", Object::Reference(pages_root));
        source.objects.insert(page_id, Object::Dictionary(page));
    }

    prepend_kids(source, pages_root, &toc_page_ids)?;
    register_destinations(source, &source_page_ids, destinations)?;

    let report = MergeReport {
        toc_pages: toc_page_ids.len(),
        source_pages: source_page_ids.len(),
        destinations: destinations.len(),
        links: link_count,
    };
    debug!("merge finished: {:?}", report);
    Ok(report)
}

/// Convenience wrapper working on serialized documents.
pub fn prepend_toc_bytes(
    source_pdf: &[u8],
    toc_pdf: &[u8],
    links: &[LinkRegion],
    destinations: &[NamedDestination],
) -> Result<(Vec<u8>, MergeReport), TocError> {
    let mut source = Document::load_mem(source_pdf)?;
    let report = prepend_toc(&mut source, toc_pdf, links, destinations)?;
    let mut buffer = Vec::new();
    source.save_to(&mut buffer)?;
    Ok((buffer, report))
}

fn catalog_id(document: &Document) -> Result<ObjectId, TocError> {
    document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| TocError::MissingCatalog)
}

fn pages_root_id(document: &Document) -> Result<ObjectId, TocError> {
    crate::outline::catalog(document)?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| TocError::MissingPageTree)
}

/// Catalog, page tree nodes and info dictionary of the TOC: none of them are carried over.
fn structural_object_ids(toc: &Document) -> Result<Vec<ObjectId>, TocError> {
    let mut ids = vec![catalog_id(toc)?];
    if let Ok(info) = toc.trailer.get(b"Info").and_then(Object::as_reference) {
        ids.push(info);
    }
    for (id, object) in &toc.objects {
        if let Ok(dictionary) = object.as_dict() {
            if dictionary.get(b"Type").and_then(Object::as_name).ok() == Some(b"Pages".as_slice()) {
                ids.push(*id);
            }
        }
    }
    Ok(ids)
}

/// Returns a copy of the page dictionary with inherited attributes made explicit.
fn flattened_page(document: &Document, page_id: ObjectId) -> Result<Dictionary, TocError> {
    let mut page = document.get_object(page_id)?.as_dict()?.clone();

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut hops = 0;
    while let Some(parent_id) = parent {
        if hops > 32 {
            break;
        }
        hops += 1;
        let Ok(node) = document.get_object(parent_id).and_then(Object::as_dict) else {
            break;
        };
        for key in INHERITABLE_KEYS {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(page)
}

fn object_to_f64(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// Height of the page's media box in points; US letter height when it cannot be read.
fn media_box_height(document: &Document, page: &Dictionary) -> f64 {
    page.get(b"MediaBox")
        .ok()
        .and_then(|object| resolve(document, object))
        .and_then(|object| object.as_array().ok())
        .filter(|items| items.len() == 4)
        .and_then(|items| Some(object_to_f64(&items[3])? - object_to_f64(&items[1])?))
        .unwrap_or(792.0)
}

fn link_annotation(link: &LinkRegion, page_height: f64) -> Object {
    let left = link.x * PT_PER_MM;
    let right = (link.x + link.width) * PT_PER_MM;
    let top = page_height - link.y * PT_PER_MM;
    let bottom = page_height - (link.y + link.height) * PT_PER_MM;

    let mut annotation = Dictionary::new();
    annotation.set("Type", Object::Name(b"Annot".to_vec()));
    annotation.set("Subtype", Object::Name(b"Link".to_vec()));
    annotation.set(
        "Rect",
        Object::Array(vec![
            Object::from(left),
            Object::from(bottom),
            Object::from(right),
            Object::from(top),
        ]),
    );
    annotation.set(
        "Border",
        Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)]),
    );
    annotation.set("Dest", Object::string_literal(link.destination.as_str()));
    Object::Dictionary(annotation)
}

fn prepend_kids(
    document: &mut Document,
    pages_root: ObjectId,
    page_ids: &[ObjectId],
) -> Result<(), TocError> {
    let root = document
        .get_object_mut(pages_root)
        .and_then(Object::as_dict_mut)
        .map_err(|_| TocError::MissingPageTree)?;

    let mut kids: Vec<Object> = page_ids.iter().copied().map(Object::Reference).collect();
    if let Ok(Object::Array(existing)) = root.get(b"Kids") {
        kids.extend(existing.iter().cloned());
    }
    let count = root.get(b"Count").and_then(Object::as_i64).unwrap_or(0);

    root.set("Kids", Object::Array(kids));
    root.set("Count", Object::Integer(count + page_ids.len() as i64));
    Ok(())
}

fn register_destinations(
    document: &mut Document,
    source_page_ids: &[ObjectId],
    destinations: &[NamedDestination],
) -> Result<(), TocError> {
    if destinations.is_empty() {
        return Ok(());
    }

    let mut entries: BTreeMap<Vec<u8>, Object> = existing_destinations(document)?;
    for destination in destinations {
        let page_id = *source_page_ids
            .get(destination.source_page)
            .ok_or_else(|| TocError::MissingPage {
                destination: destination.name.clone(),
                page_index: destination.source_page,
            })?;
        let page = document.get_object(page_id)?.as_dict()?.clone();
        let top = media_box_top(document, page_id, &page);
        entries.insert(
            destination.name.clone().into_bytes(),
            Object::Array(vec![
                Object::Reference(page_id),
                Object::Name(b"FitH".to_vec()),
                Object::from(top),
            ]),
        );
    }

    let mut names = Vec::with_capacity(entries.len() * 2);
    for (key, value) in entries {
        names.push(Object::String(key, lopdf::StringFormat::Literal));
        names.push(value);
    }
    let mut tree = Dictionary::new();
    tree.set("Names", Object::Array(names));
    let tree_id = document.add_object(Object::Dictionary(tree));

    let catalog_id = catalog_id(document)?;
    let names_ref = document
        .get_object(catalog_id)?
        .as_dict()
        .map_err(|_| TocError::InvalidCatalog)?
        .get(b"Names")
        .and_then(Object::as_reference)
        .ok();

    match names_ref {
        Some(names_id) => {
            document
                .get_object_mut(names_id)
                .and_then(Object::as_dict_mut)?
                .set("Dests", Object::Reference(tree_id));
        }
        None => {
            let catalog = document
                .get_object_mut(catalog_id)
                .and_then(Object::as_dict_mut)
                .map_err(|_| TocError::InvalidCatalog)?;
            let mut names = match catalog.get(b"Names") {
                Ok(Object::Dictionary(inline)) => inline.clone(),
                _ => Dictionary::new(),
            };
            names.set("Dests", Object::Reference(tree_id));
            catalog.set("Names", Object::Dictionary(names));
        }
    }

    Ok(())
}

/// Top edge of a page's media box, following inherited attributes.
fn media_box_top(document: &Document, page_id: ObjectId, page: &Dictionary) -> f64 {
    if page.has(b"MediaBox") {
        return media_box_height(document, page);
    }
    flattened_page(document, page_id)
        .map(|flattened| media_box_height(document, &flattened))
        .unwrap_or(792.0)
}

fn existing_destinations(document: &Document) -> Result<BTreeMap<Vec<u8>, Object>, TocError> {
    let catalog = crate::outline::catalog(document)?;
    let mut entries = BTreeMap::new();
    if let Some(tree) = catalog
        .get(b"Names")
        .ok()
        .and_then(|object| resolve(document, object))
        .and_then(|object| object.as_dict().ok())
        .and_then(|names| names.get(b"Dests").ok())
        .and_then(|object| resolve(document, object))
        .and_then(|object| object.as_dict().ok())
    {
        collect_name_tree(document, tree, 0, &mut entries);
    }
    Ok(entries
        .into_iter()
        .map(|(key, value)| (key, value.clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use lopdf::{Document, Object};

    use super::{prepend_toc_bytes, NamedDestination};
    use crate::layout::LinkRegion;
    use crate::outline::extract_bookmarks;
    use crate::sample::{build_outlined_pdf, OutlineNode};

    fn source() -> Vec<u8> {
        build_outlined_pdf(
            5,
            &[
                OutlineNode::new("One", 0),
                OutlineNode::new("Three", 2).with_child(OutlineNode::new("Four", 3)),
            ],
        )
        .unwrap()
    }

    fn fake_toc(pages: usize) -> Vec<u8> {
        build_outlined_pdf(pages, &[]).unwrap()
    }

    fn link(page: usize, destination: &str) -> LinkRegion {
        LinkRegion {
            page,
            x: 10.0,
            y: 20.0,
            width: 50.0,
            height: 6.0,
            destination: destination.to_owned(),
        }
    }

    fn destination_names(document: &Document) -> Vec<(String, lopdf::ObjectId)> {
        let catalog = crate::outline::catalog(document).unwrap();
        let names = catalog.get(b"Names").unwrap().as_dict().unwrap();
        let tree_id = names.get(b"Dests").unwrap().as_reference().unwrap();
        let tree = document.get_dictionary(tree_id).unwrap();
        let array = tree.get(b"Names").unwrap().as_array().unwrap();
        array
            .chunks_exact(2)
            .map(|pair| {
                let key = String::from_utf8(pair[0].as_str().unwrap().to_vec()).unwrap();
                let page = pair[1].as_array().unwrap()[0].as_reference().unwrap();
                (key, page)
            })
            .collect()
    }

    #[test]
    fn toc_pages_come_first_and_outline_survives() {
        let (merged, report) = prepend_toc_bytes(
            &source(),
            &fake_toc(2),
            &[link(0, "dest2"), link(1, "dest3")],
            &[
                NamedDestination {
                    name: "dest2".to_owned(),
                    source_page: 2,
                },
                NamedDestination {
                    name: "dest3".to_owned(),
                    source_page: 3,
                },
            ],
        )
        .unwrap();

        assert_eq!(report.toc_pages, 2);
        assert_eq!(report.links, 2);
        let document = Document::load_mem(&merged).unwrap();
        assert_eq!(document.get_pages().len(), 7);

        let bookmarks = extract_bookmarks(&document).unwrap();
        let pages: Vec<usize> = bookmarks.iter().map(|bookmark| bookmark.page).collect();
        assert_eq!(pages, vec![2, 4, 5]);
    }

    #[test]
    fn destinations_point_at_shifted_pages_and_are_sorted() {
        let destinations: Vec<NamedDestination> = [3usize, 0, 2]
            .iter()
            .map(|page| NamedDestination {
                name: format!("dest{page}"),
                source_page: *page,
            })
            .collect();
        let (merged, _) = prepend_toc_bytes(&source(), &fake_toc(1), &[], &destinations).unwrap();

        let document = Document::load_mem(&merged).unwrap();
        let pages = document.get_pages();
        let names = destination_names(&document);
        let keys: Vec<&str> = names.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["dest0", "dest2", "dest3"]);
        assert_eq!(names[0].1, pages[&2]);
        assert_eq!(names[1].1, pages[&4]);
        assert_eq!(names[2].1, pages[&5]);
    }

    #[test]
    fn links_become_annotations_on_toc_pages() {
        let (merged, _) = prepend_toc_bytes(
            &source(),
            &fake_toc(1),
            &[link(0, "dest0"), link(0, "dest0")],
            &[NamedDestination {
                name: "dest0".to_owned(),
                source_page: 0,
            }],
        )
        .unwrap();

        let document = Document::load_mem(&merged).unwrap();
        let first_page = document.get_pages()[&1];
        let page = document.get_dictionary(first_page).unwrap();
        let annotations = page.get(b"Annots").unwrap().as_array().unwrap();
        assert_eq!(annotations.len(), 2);

        let annotation = document
            .get_dictionary(annotations[0].as_reference().unwrap())
            .unwrap();
        assert_eq!(annotation.get(b"Subtype").unwrap().as_name().unwrap(), b"Link");
        assert_eq!(annotation.get(b"Dest").unwrap().as_str().unwrap(), b"dest0");
        let rect = annotation.get(b"Rect").unwrap().as_array().unwrap();
        let top = match rect[3] {
            Object::Real(value) => f64::from(value),
            Object::Integer(value) => value as f64,
            _ => panic!("unexpected rect value"),
        };
        assert!((top - (842.0 - 20.0 * 72.0 / 25.4)).abs() < 0.01);
        assert!(page.has(b"Resources"));
        assert!(page.has(b"MediaBox"));
    }

    #[test]
    fn missing_source_page_is_an_error() {
        let result = prepend_toc_bytes(
            &source(),
            &fake_toc(1),
            &[],
            &[NamedDestination {
                name: "dest42".to_owned(),
                source_page: 42,
            }],
        );
        assert!(matches!(
            result,
            Err(crate::TocError::MissingPage { page_index: 42, .. })
        ));
    }
}

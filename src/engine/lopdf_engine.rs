//! [`PdfEngine`] backed by `lopdf`.
//!
//! Copying a page between documents means carrying everything it references
//! (content streams, fonts, images, annotations) into the destination's
//! object-id space. Pages are copied from a scratch clone of the source so
//! the caller's document is never touched:
//!
//! 1. inherited attributes (`Resources`, `MediaBox`, `CropBox`, `Rotate`)
//!    are written onto each page, since the page leaves its old tree;
//! 2. the clone is renumbered above the destination's `max_id`;
//! 3. the objects reachable from the selected pages (ignoring the page's
//!    `Parent` link) move into the destination;
//! 4. the pages are appended to the destination's root `Pages` node.

use super::PdfEngine;
use crate::error::EngineError;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::debug;

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// `lopdf`-based engine. Stateless; cheap to construct.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl PdfEngine for LopdfEngine {
    type Document = Document;

    fn load_document(&self, bytes: &[u8]) -> Result<Document, EngineError> {
        Document::load_mem(bytes).map_err(|e| EngineError::Load(e.to_string()))
    }

    fn create_document(&self) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn page_count(&self, doc: &Document) -> usize {
        doc.get_pages().len()
    }

    fn copy_pages(
        &self,
        dst: &mut Document,
        src: &Document,
        indices: &[usize],
    ) -> Result<(), EngineError> {
        let total = self.page_count(src);
        if let Some(&index) = indices.iter().find(|&&i| i >= total) {
            return Err(EngineError::PageIndex { index, total });
        }
        let root = pages_root(dst)?;

        for run in distinct_runs(indices) {
            let mut scratch = src.clone();
            materialise_inherited(&mut scratch);
            scratch.renumber_objects_with(dst.max_id + 1);

            let page_ids: Vec<ObjectId> = scratch.get_pages().into_values().collect();
            let selected: Vec<ObjectId> = run.iter().map(|&i| page_ids[i]).collect();

            let reachable = reachable_from(&scratch, &selected);
            debug!(
                "Copying {} page(s) with {} object(s)",
                selected.len(),
                reachable.len()
            );
            for id in reachable {
                if let Some(object) = scratch.objects.remove(&id) {
                    dst.max_id = dst.max_id.max(id.0);
                    dst.objects.insert(id, object);
                }
            }
            append_kids(dst, root, &selected)?;
        }
        Ok(())
    }

    fn serialize(&self, doc: &mut Document) -> Result<Vec<u8>, EngineError> {
        doc.compress();
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| EngineError::Save(e.to_string()))?;
        Ok(buffer)
    }
}

// ── Page tree helpers ────────────────────────────────────────────────────

/// Id of the catalog's root `Pages` node.
pub(crate) fn pages_root(doc: &Document) -> Result<ObjectId, EngineError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| EngineError::Structure("trailer has no Root reference".into()))?;
    doc.get_dictionary(catalog_id)
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|_| EngineError::Structure("catalog has no Pages reference".into()))
}

/// Append `pages` to the `Kids` of `root` and re-parent them.
pub(crate) fn append_kids(
    doc: &mut Document,
    root: ObjectId,
    pages: &[ObjectId],
) -> Result<(), EngineError> {
    for &id in pages {
        let page = doc
            .get_object_mut(id)
            .and_then(Object::as_dict_mut)
            .map_err(|_| EngineError::Structure(format!("page object {id:?} is not a dictionary")))?;
        page.set("Parent", root);
    }

    let node = doc
        .get_object_mut(root)
        .and_then(Object::as_dict_mut)
        .map_err(|_| EngineError::Structure("Pages node is not a dictionary".into()))?;
    let kids = node
        .get_mut(b"Kids")
        .and_then(Object::as_array_mut)
        .map_err(|_| EngineError::Structure("Pages node has no Kids array".into()))?;
    kids.extend(pages.iter().map(|&id| Object::Reference(id)));

    let count = node.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    node.set("Count", count + pages.len() as i64);
    Ok(())
}

/// Split `indices` into consecutive runs without repeats, so each run can be
/// copied from a single scratch clone.
fn distinct_runs(indices: &[usize]) -> Vec<Vec<usize>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    let mut seen = HashSet::new();
    for &i in indices {
        if !seen.insert(i) {
            runs.push(std::mem::take(&mut current));
            seen.clear();
            seen.insert(i);
        }
        current.push(i);
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Copy inherited attributes down onto every page.
fn materialise_inherited(doc: &mut Document) {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for page_id in page_ids {
        let inherited: Vec<(&[u8], Object)> = match doc.get_dictionary(page_id) {
            Ok(page) => INHERITABLE
                .iter()
                .filter(|key| !page.has(key))
                .filter_map(|key| inherited_value(doc, page, key).map(|v| (*key, v)))
                .collect(),
            Err(_) => continue,
        };
        if inherited.is_empty() {
            continue;
        }
        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            for (key, value) in inherited {
                page.set(key, value);
            }
        }
    }
}

fn inherited_value(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Every object id reachable from `roots`, not following page-tree `Parent`
/// links.
fn reachable_from(doc: &Document, roots: &[ObjectId]) -> BTreeSet<ObjectId> {
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<ObjectId> = roots.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(object) = doc.objects.get(&id) {
            let mut refs = Vec::new();
            collect_refs(object, &mut refs);
            queue.extend(refs.into_iter().filter(|r| !seen.contains(r)));
        }
    }
    seen
}

fn collect_refs(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|o| collect_refs(o, out)),
        Object::Dictionary(dict) => collect_dict_refs(dict, out),
        Object::Stream(stream) => collect_dict_refs(&stream.dict, out),
        _ => {}
    }
}

fn collect_dict_refs(dict: &Dictionary, out: &mut Vec<ObjectId>) {
    let page_node = matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Page") | Ok(b"Pages")
    );
    for (key, value) in dict.iter() {
        if page_node && key.as_slice() == b"Parent" {
            continue;
        }
        collect_refs(value, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream;

    /// Pages share one inherited MediaBox and Resources dict on the root node.
    fn fixture(pages: usize) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let mut kids = Vec::new();
        for n in 0..pages {
            let content = format!("BT /F1 12 Tf 50 700 Td (Page-{}) Tj ET", n + 1);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn page_text(doc: &Document, page_number: u32) -> String {
        let page_id = doc.get_pages()[&page_number];
        String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
    }

    #[test]
    fn created_document_is_empty_and_serialises() {
        let engine = LopdfEngine;
        let mut doc = engine.create_document();
        assert_eq!(engine.page_count(&doc), 0);
        let bytes = engine.serialize(&mut doc).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
    }

    #[test]
    fn copies_selected_pages_in_order() {
        let engine = LopdfEngine;
        let src = fixture(4);
        let mut dst = engine.create_document();
        engine.copy_pages(&mut dst, &src, &[3, 0]).unwrap();
        assert_eq!(engine.page_count(&dst), 2);
        assert!(page_text(&dst, 1).contains("Page-4"));
        assert!(page_text(&dst, 2).contains("Page-1"));
    }

    #[test]
    fn inherited_attributes_travel_with_the_page() {
        let engine = LopdfEngine;
        let src = fixture(2);
        let mut dst = engine.create_document();
        engine.copy_pages(&mut dst, &src, &[1]).unwrap();
        let page_id = dst.get_pages()[&1];
        let page = dst.get_dictionary(page_id).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
    }

    #[test]
    fn duplicate_indices_produce_distinct_objects() {
        let engine = LopdfEngine;
        let src = fixture(1);
        let mut dst = engine.create_document();
        engine.copy_pages(&mut dst, &src, &[0, 0]).unwrap();
        let ids: Vec<ObjectId> = dst.get_pages().into_values().collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn source_is_untouched() {
        let engine = LopdfEngine;
        let src = fixture(3);
        let before = src.objects.len();
        let max_before = src.max_id;
        let mut dst = engine.create_document();
        engine.copy_pages(&mut dst, &src, &[0, 1, 2]).unwrap();
        assert_eq!(src.objects.len(), before);
        assert_eq!(src.max_id, max_before);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let engine = LopdfEngine;
        let src = fixture(2);
        let mut dst = engine.create_document();
        let err = engine.copy_pages(&mut dst, &src, &[2]).unwrap_err();
        assert!(matches!(err, EngineError::PageIndex { index: 2, total: 2 }));
        assert_eq!(engine.page_count(&dst), 0);
    }

    #[test]
    fn copied_document_round_trips() {
        let engine = LopdfEngine;
        let src = fixture(3);
        let mut dst = engine.create_document();
        engine.copy_pages(&mut dst, &src, &[0, 2]).unwrap();
        let bytes = engine.serialize(&mut dst).unwrap();
        let reloaded = engine.load_document(&bytes).unwrap();
        assert_eq!(engine.page_count(&reloaded), 2);
        assert!(page_text(&reloaded, 2).contains("Page-3"));
    }

    #[test]
    fn distinct_runs_break_on_repeats() {
        assert_eq!(distinct_runs(&[0, 1, 0, 2]), vec![vec![0, 1], vec![0, 2]]);
        assert!(distinct_runs(&[]).is_empty());
    }
}

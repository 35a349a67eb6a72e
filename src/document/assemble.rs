//! Building new documents out of pages of existing ones.
//!
//! Pages are moved between documents by renumbering every object of the
//! source so ids cannot collide, then hanging the chosen page objects under a
//! fresh page tree. Attributes a page inherits from its ancestors are copied
//! onto the page first, otherwise they would be lost with the old tree.

use std::collections::BTreeMap;

use log::debug;
use lopdf::{dictionary, Object, ObjectId};

use super::Document;
use crate::error::{ManagerError, ManagerResult};

/// Page attributes a page may inherit from its parent `Pages` nodes.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards the parent walk against malformed, cyclic page trees.
const MAX_TREE_DEPTH: usize = 64;

/// Looks up `key` on a page, falling back to its ancestors.
pub(crate) fn inherited_attribute(
    document: &lopdf::Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<Object> {
    let mut node = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = document.get_object(node).and_then(Object::as_dict).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        node = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Copies inherited attributes onto every page of `document`.
pub(crate) fn pin_inherited_attributes(document: &mut lopdf::Document) {
    for page_id in document.get_pages().into_values() {
        let mut missing = Vec::new();
        for key in INHERITABLE {
            let present = document
                .get_object(page_id)
                .and_then(Object::as_dict)
                .map_or(true, |dict| dict.has(key));
            if present {
                continue;
            }
            if let Some(value) = inherited_attribute(document, page_id, key) {
                missing.push((key, value));
            }
        }

        if missing.is_empty() {
            continue;
        }
        if let Ok(dict) = document.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            for (key, value) in missing {
                dict.set(key.to_vec(), value);
            }
        }
    }
}

impl Document {
    /// Builds a new document from pages of existing documents.
    ///
    /// Each part names a source document and the 1-based page numbers to take
    /// from it. Pages appear in the result in the order given.
    pub fn concat<'a, I>(parts: I) -> ManagerResult<Document>
    where
        I: IntoIterator<Item = (&'a Document, Vec<u32>)>,
    {
        let mut max_id = 1;
        let mut version = String::from("1.5");
        let mut objects = BTreeMap::new();
        let mut kids = Vec::new();

        for (document, page_numbers) in parts {
            let mut source = document.inner.clone();
            pin_inherited_attributes(&mut source);
            source.renumber_objects_with(max_id);
            max_id = source.max_id + 1;

            let pages = source.get_pages();
            for number in page_numbers {
                let page_id = pages.get(&number).copied().ok_or_else(|| {
                    ManagerError::invalid_input(
                        "page",
                        format!("page {} not found in '{}'", number, document.label()),
                    )
                })?;
                kids.push(page_id);
            }

            if source.version > version {
                version = source.version.clone();
            }
            objects.extend(source.objects);
        }

        let mut merged = lopdf::Document::with_version(version);
        merged.objects = objects;
        merged.max_id = max_id;

        let pages_id = merged.new_object_id();
        for &kid in &kids {
            if let Ok(dict) = merged.get_object_mut(kid).and_then(Object::as_dict_mut) {
                dict.set("Parent", pages_id);
            }
        }
        merged.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
            }),
        );
        let catalog_id = merged.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        merged.trailer.set("Root", catalog_id);

        merged.prune_objects();
        merged.renumber_objects();
        debug!("Assembled document with {} page(s)", kids.len());

        Ok(Document::from_lopdf(merged))
    }

    /// Every page as its own single-page document, in page order.
    pub fn split_pages(&self) -> ManagerResult<Vec<Document>> {
        let count = self.page_count() as u32;
        (1..=count)
            .map(|number| {
                Document::concat([(self, vec![number])])
                    .map(|page| page.with_source(self.source.clone()))
            })
            .collect()
    }

    /// All pages of `documents`, in order, as one document.
    pub fn merge_all<'a, I>(documents: I) -> ManagerResult<Document>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        Document::concat(documents.into_iter().map(|document| {
            let numbers = (1..=document.page_count() as u32).collect();
            (document, numbers)
        }))
    }
}

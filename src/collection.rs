//! Ordered collection of loaded documents.
//!
//! Every operation rebuilds the collection from the current order. Selected
//! documents are replaced in place by the output of the operation; the
//! others are passed through or dropped depending on `keep_others`.

use std::collections::BTreeMap;

use crate::document::Document;
use crate::domain::Selection;
use crate::error::{ManagerError, ManagerResult};

/// Ordered, index-addressable list of documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentCollection {
    documents: Vec<Document>,
}

impl DocumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    pub fn as_slice(&self) -> &[Document] {
        &self.documents
    }

    /// Appends documents at the end, keeping their order.
    pub fn extend<I: IntoIterator<Item = Document>>(&mut self, documents: I) {
        self.documents.extend(documents);
    }

    /// Replaces each selected document by the documents `op` produces.
    ///
    /// All replacements are computed before the collection changes, so a
    /// failing `op` leaves the collection untouched.
    pub fn transform<F>(
        &mut self,
        selection: &Selection,
        keep_others: bool,
        mut op: F,
    ) -> ManagerResult<()>
    where
        F: FnMut(&Document) -> ManagerResult<Vec<Document>>,
    {
        let selected = selection.resolve(self.len())?;
        let mut replacements = BTreeMap::new();
        for index in selected {
            if replacements.contains_key(&index) {
                continue;
            }
            replacements.insert(index, op(&self.documents[index])?);
        }

        let current = std::mem::take(&mut self.documents);
        self.documents = rebuild(current, replacements, keep_others);
        Ok(())
    }

    /// Replaces each selected document, one at a time, by the output of `op`.
    ///
    /// Documents are committed as soon as they are processed: if `op` fails,
    /// documents replaced earlier in the same call stay replaced and the
    /// error is returned. Non-selected documents are dropped only when every
    /// selected document succeeded and `keep_others` is false.
    pub fn replace_each<F>(
        &mut self,
        selection: &Selection,
        keep_others: bool,
        mut op: F,
    ) -> ManagerResult<()>
    where
        F: FnMut(&Document) -> ManagerResult<Document>,
    {
        let mut selected = selection.resolve(self.len())?;
        selected.sort_unstable();
        selected.dedup();

        for &index in &selected {
            let replacement = op(&self.documents[index])?;
            self.documents[index] = replacement;
        }

        if !keep_others {
            let current = std::mem::take(&mut self.documents);
            self.documents = current
                .into_iter()
                .enumerate()
                .filter(|(index, _)| selected.binary_search(index).is_ok())
                .map(|(_, document)| document)
                .collect();
        }
        Ok(())
    }

    /// One document holding the pages of every selected document.
    ///
    /// Pages follow the order of the selection, not the collection.
    pub fn merged(&self, selection: &Selection) -> ManagerResult<Document> {
        let selected = selection.resolve(self.len())?;
        if selected.is_empty() {
            return Err(ManagerError::EmptySelection {
                operation: "merge".to_string(),
            });
        }
        Document::merge_all(selected.into_iter().map(|index| &self.documents[index]))
    }

    /// Keeps only the selected documents, in collection order.
    pub fn keep(&mut self, selection: &Selection) -> ManagerResult<()> {
        self.retain_where(selection, true)
    }

    /// Drops the selected documents, keeping the rest in collection order.
    pub fn drop(&mut self, selection: &Selection) -> ManagerResult<()> {
        self.retain_where(selection, false)
    }

    /// Replaces the whole collection.
    pub fn replace_all(&mut self, documents: Vec<Document>) {
        self.documents = documents;
    }

    fn retain_where(&mut self, selection: &Selection, selected: bool) -> ManagerResult<()> {
        selection.resolve(self.len())?;
        let current = std::mem::take(&mut self.documents);
        self.documents = current
            .into_iter()
            .enumerate()
            .filter(|(index, _)| selection.contains(*index) == selected)
            .map(|(_, document)| document)
            .collect();
        Ok(())
    }
}

impl<'a> IntoIterator for &'a DocumentCollection {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

/// Rebuilds `items` in order, splicing in replacements by original position.
fn rebuild<T>(
    items: Vec<T>,
    mut replacements: BTreeMap<usize, Vec<T>>,
    keep_others: bool,
) -> Vec<T> {
    let mut rebuilt = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match replacements.remove(&index) {
            Some(replacement) => rebuilt.extend(replacement),
            None if keep_others => rebuilt.push(item),
            None => {}
        }
    }
    rebuilt
}

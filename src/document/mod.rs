//! Loaded PDF documents.
//!
//! A [`Document`] is the page-assembly view of a PDF: an ordered list of
//! pages that can be copied into new documents, rotated, recompressed and
//! serialized. It has no text or geometry access of its own; that view is
//! reached through a [`RedactionStrategy`](crate::redaction::RedactionStrategy)
//! working on the serialized bytes.

mod assemble;
mod images;
mod transform;

use assemble::inherited_attribute;

use std::fs;
use std::panic;
use std::path::{Path, PathBuf};

use log::debug;
use lopdf::Object;

use crate::error::{ManagerError, ManagerResult};

/// US Letter, used when a page carries no usable MediaBox.
const FALLBACK_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// An ordered sequence of pages.
#[derive(Debug, Clone)]
pub struct Document {
    inner: lopdf::Document,
    source: Option<PathBuf>,
}

impl Document {
    /// Loads a PDF from disk.
    pub fn load(path: &Path) -> ManagerResult<Self> {
        if !path.exists() {
            return Err(ManagerError::load(path, "file does not exist"));
        }

        let inner = lopdf::Document::load(path).map_err(|e| ManagerError::load(path, e))?;
        debug!(
            "Loaded '{}' ({} page(s))",
            path.display(),
            inner.get_pages().len()
        );

        Ok(Self {
            inner,
            source: Some(path.to_path_buf()),
        })
    }

    /// Parses a serialized PDF.
    pub fn from_bytes(bytes: &[u8]) -> ManagerResult<Self> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| ManagerError::serialization("reading document bytes", e))?;
        Ok(Self::from_lopdf(inner))
    }

    pub(crate) fn from_lopdf(inner: lopdf::Document) -> Self {
        Self {
            inner,
            source: None,
        }
    }

    pub(crate) fn with_source(mut self, source: Option<PathBuf>) -> Self {
        self.source = source;
        self
    }

    /// Path the document was loaded from, if it came from disk.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Short label for log messages.
    pub(crate) fn label(&self) -> String {
        self.source
            .as_ref()
            .map_or_else(|| "<in-memory>".to_string(), |p| p.display().to_string())
    }

    pub fn lopdf(&self) -> &lopdf::Document {
        &self.inner
    }

    /// Serializes the document.
    pub fn to_bytes(&self) -> ManagerResult<Vec<u8>> {
        let mut document = self.inner.clone();
        let mut buffer = Vec::new();
        document
            .save_to(&mut buffer)
            .map_err(|e| ManagerError::serialization("writing document bytes", e))?;
        Ok(buffer)
    }

    /// Serializes the document to `path`.
    pub fn write_to_path(&self, path: &Path) -> ManagerResult<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| ManagerError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Width and height of every page in points, from its MediaBox.
    pub fn page_sizes(&self) -> Vec<(f32, f32)> {
        self.inner
            .get_pages()
            .into_values()
            .map(|page_id| {
                inherited_attribute(&self.inner, page_id, b"MediaBox")
                    .and_then(|media_box| media_box_size(&self.inner, &media_box))
                    .unwrap_or(FALLBACK_PAGE_SIZE)
            })
            .collect()
    }

    /// Effective clockwise rotation of every page, in `0..360`.
    pub fn page_rotations(&self) -> Vec<i64> {
        self.inner
            .get_pages()
            .into_values()
            .map(|page_id| {
                inherited_attribute(&self.inner, page_id, b"Rotate")
                    .and_then(|rotate| rotate.as_i64().ok())
                    .unwrap_or(0)
                    .rem_euclid(360)
            })
            .collect()
    }

    /// Plain text of the whole document.
    ///
    /// pdf-extract panics on some malformed content streams that other
    /// readers accept; such panics are reported as serialization errors.
    pub fn extract_text(&self) -> ManagerResult<String> {
        let bytes = self.to_bytes()?;
        panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
            .map_err(|_| {
                ManagerError::serialization("extracting document text", "text extractor panicked")
            })?
            .map_err(|e| ManagerError::serialization("extracting document text", e))
    }
}

fn resolve<'a>(document: &'a lopdf::Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn media_box_size(document: &lopdf::Document, media_box: &Object) -> Option<(f32, f32)> {
    let corners = resolve(document, media_box)?.as_array().ok()?;
    if corners.len() != 4 {
        return None;
    }
    let mut values = [0.0f32; 4];
    for (value, corner) in values.iter_mut().zip(corners) {
        *value = resolve(document, corner)?.as_float().ok()?;
    }
    Some(((values[2] - values[0]).abs(), (values[3] - values[1]).abs()))
}

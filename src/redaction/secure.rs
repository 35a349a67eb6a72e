//! Secure redaction strategy using MuPDF.
//!
//! MuPDF reads each page's text, locates the matched strings on the same
//! page, turns each hit into a redaction annotation and applies it. Applying
//! physically removes the covered content and paints a black box.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use log::debug;
use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfPage};
use mupdf::Page;
use tempfile::NamedTempFile;

use super::strategy::{RedactedPdf, RedactionResult, RedactionStrategy};
use super::{apply_redactions, RedactablePage};
use crate::domain::{ContentQuery, Region};
use crate::error::{ManagerError, ManagerResult};

/// MuPDF font loading is not thread-safe; all MuPDF work is serialized.
static MUPDF_LOCK: Mutex<()> = Mutex::new(());

/// Secure redaction strategy that physically removes text using MuPDF.
///
/// The serialized document is written to a temporary file for MuPDF and the
/// result is read back from a second one. Both files are deleted when the
/// call returns, on success or failure.
#[derive(Debug, Clone)]
pub struct SecureRedactionStrategy {
    /// Maximum search hits per matched string and page
    max_hits: u32,
}

impl SecureRedactionStrategy {
    /// Creates a new secure redaction strategy with default settings.
    pub fn new() -> Self {
        Self { max_hits: 500 }
    }

    /// Sets the maximum number of search hits per matched string.
    pub fn with_max_hits(mut self, max_hits: u32) -> Self {
        self.max_hits = max_hits;
        self
    }

    pub fn max_hits(&self) -> u32 {
        self.max_hits
    }

    fn redact_pages(
        &self,
        pdf_doc: &PdfDocument,
        query: &ContentQuery,
    ) -> ManagerResult<RedactionResult> {
        let page_count = pdf_doc
            .page_count()
            .map_err(|e| ManagerError::backend("MuPDF", format!("Failed to get page count: {}", e)))?;

        let mut result = RedactionResult {
            pages_processed: page_count as usize,
            secure: true,
            ..Default::default()
        };

        for page_idx in 0..page_count {
            let page = pdf_doc.load_page(page_idx).map_err(|e| {
                ManagerError::backend("MuPDF", format!("Failed to load page {}: {}", page_idx + 1, e))
            })?;

            // Skip non-PDF pages
            let Ok(pdf_page) = PdfPage::try_from(page.clone()) else {
                continue;
            };

            let mut target = MupdfPage {
                page,
                pdf_page,
                number: page_idx as usize + 1,
                max_hits: self.max_hits,
            };

            let text = target.text()?;
            let redacted = apply_redactions(&mut target, query.scan(text.lines()))?;
            if redacted > 0 {
                debug!("Redacted {} region(s) on page {}", redacted, target.number);
                result.instances_redacted += redacted;
                result.pages_modified += 1;
            }
        }

        Ok(result)
    }
}

impl Default for SecureRedactionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl RedactionStrategy for SecureRedactionStrategy {
    fn redact(&self, pdf: &[u8], query: &ContentQuery) -> ManagerResult<RedactedPdf> {
        let _guard = MUPDF_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        let mut input = NamedTempFile::new()
            .map_err(|e| ManagerError::serialization("creating temporary input", e))?;
        input
            .write_all(pdf)
            .and_then(|()| input.flush())
            .map_err(|e| ManagerError::serialization("writing temporary input", e))?;

        let pdf_doc = PdfDocument::open(temp_path_str(input.path())?)
            .map_err(|e| ManagerError::serialization("opening document in MuPDF", e))?;

        let result = self.redact_pages(&pdf_doc, query)?;
        if !result.has_redactions() {
            return Ok(RedactedPdf {
                bytes: pdf.to_vec(),
                result,
            });
        }

        let output = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| ManagerError::serialization("creating temporary output", e))?;
        pdf_doc
            .save(temp_path_str(output.path())?)
            .map_err(|e| ManagerError::serialization("saving redacted document", e))?;
        let bytes = fs::read(output.path())
            .map_err(|e| ManagerError::serialization("reading redacted document", e))?;

        Ok(RedactedPdf { bytes, result })
    }

    fn name(&self) -> &str {
        "SecureRedaction"
    }

    fn is_secure(&self) -> bool {
        true
    }
}

fn temp_path_str(path: &Path) -> ManagerResult<&str> {
    path.to_str()
        .ok_or_else(|| ManagerError::invalid_input("path", "Path contains invalid UTF-8"))
}

/// A MuPDF page seen through both its generic and its PDF interface.
struct MupdfPage {
    page: Page,
    pdf_page: PdfPage,
    number: usize,
    max_hits: u32,
}

impl MupdfPage {
    /// Plain text of the page, one line per text line.
    fn text(&self) -> ManagerResult<String> {
        self.page.to_text().map_err(|e| {
            ManagerError::backend(
                "MuPDF",
                format!("Failed to read text of page {}: {}", self.number, e),
            )
        })
    }
}

impl RedactablePage for MupdfPage {
    fn locate(&self, needle: &str) -> ManagerResult<Vec<Region>> {
        let hits = self.page.search(needle, self.max_hits).map_err(|e| {
            ManagerError::backend("MuPDF", format!("Search failed for '{}': {}", needle, e))
        })?;

        Ok(hits
            .into_iter()
            .map(|quad| {
                Region::bounding([
                    (quad.ul.x, quad.ul.y),
                    (quad.ur.x, quad.ur.y),
                    (quad.ll.x, quad.ll.y),
                    (quad.lr.x, quad.lr.y),
                ])
            })
            .collect())
    }

    fn mark(&mut self, region: Region) -> ManagerResult<()> {
        let annot = self
            .pdf_page
            .create_annotation(PdfAnnotationType::Redact)
            .map_err(|e| {
                ManagerError::backend(
                    "MuPDF",
                    format!("Failed to create redaction on page {}: {}", self.number, e),
                )
            })?;

        unsafe {
            ffi::set_annotation_rect(&annot, region);
        }
        Ok(())
    }

    fn commit(&mut self) -> ManagerResult<()> {
        self.pdf_page.redact().map_err(|e| {
            ManagerError::backend(
                "MuPDF",
                format!("Failed to apply redactions on page {}: {}", self.number, e),
            )
        })
    }
}

/// FFI helpers for MuPDF annotation operations.
mod ffi {
    use mupdf::pdf::PdfAnnotation;

    use crate::domain::Region;

    /// Sets the rectangle of a PDF annotation through the C API.
    ///
    /// # Safety
    /// `annot` must be a live annotation created by the current MuPDF
    /// document; the binding exposes no safe setter for the rectangle.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, region: Region) {
        #[repr(C)]
        struct PdfAnnotRaw {
            inner: *mut mupdf_sys::pdf_annot,
        }

        let raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
        let ctx = mupdf_sys::mupdf_new_base_context();
        if ctx.is_null() {
            return;
        }

        let rect = mupdf_sys::fz_rect {
            x0: region.x0,
            y0: region.y0,
            x1: region.x1,
            y1: region.y1,
        };
        mupdf_sys::pdf_set_annot_rect(ctx, raw.inner, rect);
        mupdf_sys::mupdf_drop_base_context(ctx);
    }
}

//! Fluent document manager.
//!
//! [`PdfManager`] is an explicit mutable context: each operation borrows it
//! exclusively, completes (including any serialization round trip) and hands
//! the manager back so calls can be chained with `?`.
//!
//! ```no_run
//! use pdf_manager::{ContentQuery, PdfManager, Selection};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let query = ContentQuery::new(r"\d{3}-\d{2}-\d{4}")?.starting_at("Employee");
//!
//! PdfManager::new()
//!     .add(["contract", "annex.pdf"])?
//!     .rotate(90, 1, true)?
//!     .hide_content(&query, Selection::All, true)?
//!     .save(Some("signed.pdf"))?;
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::collection::DocumentCollection;
use crate::config::ManagerConfig;
use crate::document::Document;
use crate::domain::{ensure_pdf_extension, ContentQuery, Selection};
use crate::error::{ManagerError, ManagerResult};
use crate::redaction::{RedactionResult, RedactionStrategy, SecureRedactionStrategy};

/// Ordered collection of PDFs with chainable operations.
pub struct PdfManager {
    documents: DocumentCollection,
    config: ManagerConfig,
    strategy: Box<dyn RedactionStrategy>,
    last_redaction: Option<RedactionResult>,
}

impl PdfManager {
    /// Creates an empty manager with default settings.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Creates an empty manager using MuPDF redaction tuned by `config`.
    pub fn with_config(config: ManagerConfig) -> Self {
        let strategy = SecureRedactionStrategy::new().with_max_hits(config.max_hits);
        Self {
            documents: DocumentCollection::new(),
            config,
            strategy: Box::new(strategy),
            last_redaction: None,
        }
    }

    /// Replaces the redaction strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn RedactionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Creates a manager holding the PDF at `path`.
    pub fn open(path: impl AsRef<Path>) -> ManagerResult<Self> {
        let mut manager = Self::new();
        manager.add([path.as_ref()])?;
        Ok(manager)
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &DocumentCollection {
        &self.documents
    }

    pub fn get(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    /// Totals of the most recent `hide_content` call.
    pub fn last_redaction(&self) -> Option<&RedactionResult> {
        self.last_redaction.as_ref()
    }

    /// Loads PDFs and appends them in the given order.
    ///
    /// A `.pdf` extension is appended to paths that lack one. Nothing is
    /// appended unless every path loads.
    pub fn add<I, P>(&mut self, paths: I) -> ManagerResult<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let loaded = paths
            .into_iter()
            .map(|path| Document::load(&ensure_pdf_extension(path.as_ref())))
            .collect::<ManagerResult<Vec<_>>>()?;
        info!("Added {} document(s)", loaded.len());
        self.documents.extend(loaded);
        Ok(self)
    }

    /// Appends one document with a page per image, in the given order.
    pub fn add_from_images<I, P>(&mut self, image_paths: I) -> ManagerResult<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths: Vec<P> = image_paths.into_iter().collect();
        let document = Document::from_images(&paths, self.config.image_dpi)?;
        info!("Added document built from {} image(s)", paths.len());
        self.documents.extend([document]);
        Ok(self)
    }

    /// Splits every selected document into single-page documents.
    pub fn split(
        &mut self,
        selection: impl Into<Selection>,
        keep_others: bool,
    ) -> ManagerResult<&mut Self> {
        self.documents
            .transform(&selection.into(), keep_others, Document::split_pages)?;
        info!("Split documents, collection now holds {}", self.len());
        Ok(self)
    }

    /// Rotates every page of the selected documents clockwise by `angle`.
    pub fn rotate(
        &mut self,
        angle: i64,
        selection: impl Into<Selection>,
        keep_others: bool,
    ) -> ManagerResult<&mut Self> {
        self.documents
            .transform(&selection.into(), keep_others, |document| {
                document.rotated(angle).map(|rotated| vec![rotated])
            })?;
        info!("Rotated documents by {} degrees", angle);
        Ok(self)
    }

    /// Re-encodes the images of the selected documents at `quality` (0-100).
    pub fn shrink(
        &mut self,
        quality: u8,
        selection: impl Into<Selection>,
        keep_others: bool,
    ) -> ManagerResult<&mut Self> {
        self.documents
            .transform(&selection.into(), keep_others, |document| {
                document.shrunk(quality).map(|shrunk| vec![shrunk])
            })?;
        info!("Shrunk documents at quality {}", quality);
        Ok(self)
    }

    /// Redacts content found by `query` in the selected documents.
    ///
    /// Each document is serialized, redacted by the strategy and parsed back.
    /// A failure stops at the failing document; documents before it stay
    /// redacted and [`last_redaction`](Self::last_redaction) reports what
    /// was done up to that point.
    pub fn hide_content(
        &mut self,
        query: &ContentQuery,
        selection: impl Into<Selection>,
        keep_others: bool,
    ) -> ManagerResult<&mut Self> {
        let strategy = self.strategy.as_ref();
        let mut total = RedactionResult::none();

        let outcome = self
            .documents
            .replace_each(&selection.into(), keep_others, |document| {
                let bytes = document.to_bytes()?;
                let redacted = strategy.redact(&bytes, query)?;
                debug!(
                    "{} redacted {} region(s) in '{}'",
                    strategy.name(),
                    redacted.result.instances_redacted,
                    document.label()
                );
                let parsed = Document::from_bytes(&redacted.bytes)?;
                total.absorb(&redacted.result);
                Ok(parsed.with_source(document.source().map(Path::to_path_buf)))
            });
        self.last_redaction = Some(total.clone());
        outcome?;

        info!(
            "Redacted {} region(s) on {} page(s)",
            total.instances_redacted, total.pages_modified
        );
        Ok(self)
    }

    /// Collapses the selected documents, in selection order, into one.
    ///
    /// Documents outside the selection are always dropped.
    pub fn merge(&mut self, selection: impl Into<Selection>) -> ManagerResult<&mut Self> {
        let merged = self.documents.merged(&selection.into())?;
        info!("Merged into one document of {} page(s)", merged.page_count());
        self.documents.replace_all(vec![merged]);
        Ok(self)
    }

    /// Keeps only the selected documents.
    pub fn keep(&mut self, selection: impl Into<Selection>) -> ManagerResult<&mut Self> {
        self.documents.keep(&selection.into())?;
        Ok(self)
    }

    /// Drops the selected documents.
    pub fn drop(&mut self, selection: impl Into<Selection>) -> ManagerResult<&mut Self> {
        self.documents.drop(&selection.into())?;
        Ok(self)
    }

    /// Writes every document, merged in collection order, to one PDF.
    ///
    /// Without a path the configured default output is used, and `.pdf` is
    /// appended when missing. The collection is left as it was unless the
    /// configuration asks for it to be collapsed into the merged document.
    pub fn save<P: AsRef<Path>>(&mut self, path: Option<P>) -> ManagerResult<&mut Self> {
        let path = match &path {
            Some(path) => ensure_pdf_extension(path.as_ref()),
            None => ensure_pdf_extension(&self.config.default_output),
        };
        if self.documents.is_empty() {
            return Err(ManagerError::EmptySelection {
                operation: "save".to_string(),
            });
        }

        let merged = self.documents.merged(&Selection::All)?;
        merged.write_to_path(&path)?;
        info!(
            "Saved {} page(s) to '{}'",
            merged.page_count(),
            path.display()
        );

        if self.config.collapse_on_save {
            self.documents.replace_all(vec![merged]);
        }
        Ok(self)
    }

    /// Writes every document to its own file `<stem>_<n>.pdf` inside `dir`.
    ///
    /// Numbering starts at 1 and follows collection order.
    pub fn save_each(&self, dir: impl AsRef<Path>, stem: &str) -> ManagerResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| ManagerError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut written = Vec::with_capacity(self.len());
        for (index, document) in self.documents.iter().enumerate() {
            let path = dir.join(format!("{}_{}.pdf", stem, index + 1));
            document.write_to_path(&path)?;
            written.push(path);
        }
        info!("Saved {} document(s) to '{}'", written.len(), dir.display());
        Ok(written)
    }
}

impl Default for PdfManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PdfManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfManager")
            .field("documents", &self.documents.len())
            .field("config", &self.config)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

//! Fluent manager for collections of PDF documents.
//!
//! Load PDFs (or build them from images), then split, rotate, shrink,
//! redact, merge, keep or drop them and save the result. Operations target
//! documents by position through a [`Selection`] and chain on a mutable
//! [`PdfManager`].
//!
//! # Architecture
//!
//! - [`domain`]: selection, the line scanner behind content redaction, geometry
//! - [`document`]: page-assembly view of a PDF (lopdf)
//! - [`redaction`]: text/geometry view and redaction strategies (MuPDF)
//! - [`collection`]: ordered collection and the selection rebuild rules
//! - [`manager`]: the fluent API
//! - [`error`]: error handling
//!
//! # Quick Start
//!
//! ```no_run
//! use pdf_manager::{ContentQuery, PdfManager, Selection};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let query = ContentQuery::new("secret[0-9]")?
//!     .starting_at("start")
//!     .ending_at("end");
//!
//! let mut manager = PdfManager::new();
//! manager
//!     .add(["a.pdf", "b.pdf"])?
//!     .split(0, true)?
//!     .hide_content(&query, Selection::All, true)?
//!     .save(Some("out.pdf"))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Scanning
//!
//! ```
//! use pdf_manager::ContentQuery;
//!
//! let query = ContentQuery::new("secret[0-9]")
//!     .unwrap()
//!     .starting_at("start")
//!     .ending_at("end");
//! let lines = ["AAA start", "secret1", "secret2 end", "secret3"];
//! let found: Vec<_> = query.scan(lines).collect();
//! assert_eq!(found, vec!["secret1", "secret2"]);
//! ```

pub mod collection;
pub mod config;
pub mod document;
pub mod domain;
pub mod error;
pub mod manager;
pub mod redaction;

pub use collection::DocumentCollection;
pub use config::{ManagerConfig, DEFAULT_OUTPUT, DEFAULT_ROTATION, DEFAULT_SHRINK_QUALITY};
pub use document::Document;
pub use domain::{ensure_pdf_extension, ContentQuery, Region, Selection};
pub use error::{ManagerError, ManagerResult};
pub use manager::PdfManager;
pub use redaction::{
    apply_redactions, RedactablePage, RedactedPdf, RedactionResult, RedactionStrategy,
    SecureRedactionStrategy,
};

//! Domain types shared by the document operations.
//!
//! This module holds the parts of the manager that do not touch a PDF
//! engine: selection of documents, the content scanner and redaction
//! geometry.

pub mod region;
pub mod scanner;
pub mod selection;

pub use region::Region;
pub use scanner::{ContentQuery, Matches};
pub use selection::Selection;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Appends a `.pdf` extension unless the path already ends with one.
pub fn ensure_pdf_extension(path: &Path) -> PathBuf {
    if path.as_os_str().to_string_lossy().ends_with(".pdf") {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".pdf");
    PathBuf::from(name)
}

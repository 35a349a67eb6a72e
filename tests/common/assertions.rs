//! Custom assertions for PDF manager testing.
//!
//! Provides domain-specific assertions that make tests more readable
//! and provide better error messages.

use pdf_manager::Document;
use std::path::Path;

/// Asserts that a pattern has been removed from a PDF's text.
///
/// # Panics
/// Panics if the pattern is still found in the PDF text.
pub fn assert_redacted(pdf_path: &Path, pattern: &str) {
    let text = extract_text_or_panic(pdf_path);
    assert!(
        !text.contains(pattern),
        "Pattern '{}' should be redacted but was found in output PDF at '{}'.\nExtracted text length: {} chars",
        pattern,
        pdf_path.display(),
        text.len()
    );
}

/// Asserts that a pattern has been preserved (not redacted) in a PDF.
///
/// # Panics
/// Panics if the pattern is not found in the PDF.
pub fn assert_preserved(pdf_path: &Path, pattern: &str) {
    let text = extract_text_or_panic(pdf_path);
    assert!(
        text.contains(pattern),
        "Pattern '{}' should be preserved but was not found in PDF at '{}'",
        pattern,
        pdf_path.display()
    );
}

/// Asserts that a PDF exists, loads and has the expected number of pages.
pub fn assert_page_count(pdf_path: &Path, expected: usize) {
    let document = load_or_panic(pdf_path);
    assert_eq!(
        document.page_count(),
        expected,
        "Unexpected page count for '{}'",
        pdf_path.display()
    );
}

/// Asserts page widths in points, rounded, in page order.
pub fn assert_page_widths(document: &Document, expected: &[f32]) {
    let actual: Vec<i64> = document
        .page_sizes()
        .iter()
        .map(|(w, _)| w.round() as i64)
        .collect();
    let expected: Vec<i64> = expected.iter().map(|w| w.round() as i64).collect();
    assert_eq!(actual, expected, "Pages are not in the expected order");
}

pub fn load_or_panic(pdf_path: &Path) -> Document {
    Document::load(pdf_path)
        .unwrap_or_else(|e| panic!("Failed to load '{}': {}", pdf_path.display(), e))
}

fn extract_text_or_panic(pdf_path: &Path) -> String {
    load_or_panic(pdf_path)
        .extract_text()
        .unwrap_or_else(|e| panic!("Failed to extract text from '{}': {}", pdf_path.display(), e))
}

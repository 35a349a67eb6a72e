//! Redaction strategy trait and supporting types.
//!
//! A strategy is the text/geometry view of a PDF: it receives the serialized
//! bytes of a page-assembly [`Document`](crate::Document), scans and redacts
//! every page, and hands back serialized bytes.

use crate::domain::ContentQuery;
use crate::error::ManagerResult;

/// Statistics about a redaction operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactionResult {
    /// Number of on-page regions redacted
    pub instances_redacted: usize,

    /// Pages processed
    pub pages_processed: usize,

    /// Pages with redactions
    pub pages_modified: usize,

    /// Whether content was physically removed (vs visually obscured)
    pub secure: bool,
}

impl RedactionResult {
    /// Creates a result indicating no redactions were needed.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if any redactions were applied.
    pub fn has_redactions(&self) -> bool {
        self.instances_redacted > 0
    }

    /// Adds the counts of `other` to this result.
    pub fn absorb(&mut self, other: &RedactionResult) {
        self.instances_redacted += other.instances_redacted;
        self.pages_processed += other.pages_processed;
        self.pages_modified += other.pages_modified;
        self.secure |= other.secure;
    }
}

/// A redacted, re-serialized document.
#[derive(Debug, Clone)]
pub struct RedactedPdf {
    pub bytes: Vec<u8>,
    pub result: RedactionResult,
}

/// Strategy for redacting content found by a [`ContentQuery`].
pub trait RedactionStrategy: Send + Sync {
    /// Redacts every page of the serialized PDF `pdf`.
    ///
    /// The whole document fails if it cannot be opened, scanned or
    /// re-serialized. Matches that cannot be located on the page are not
    /// an error.
    fn redact(&self, pdf: &[u8], query: &ContentQuery) -> ManagerResult<RedactedPdf>;

    /// Returns a human-readable name for this strategy.
    fn name(&self) -> &str;

    /// Returns whether this strategy physically removes content.
    fn is_secure(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction_result() {
        let result = RedactionResult::none();
        assert!(!result.has_redactions());

        let mut total = RedactionResult::none();
        total.absorb(&RedactionResult {
            instances_redacted: 3,
            pages_processed: 2,
            pages_modified: 1,
            secure: true,
        });
        total.absorb(&RedactionResult {
            pages_processed: 4,
            ..Default::default()
        });
        assert!(total.has_redactions());
        assert_eq!(total.pages_processed, 6);
        assert!(total.secure);
    }
}

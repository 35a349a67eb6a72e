//! Redaction of scanned content.
//!
//! [`apply_redactions`] turns the matches of a
//! [`ContentQuery`](crate::domain::ContentQuery) into on-page redactions for
//! any page type implementing [`RedactablePage`]. Strategies decide how a
//! serialized document is opened to get such pages.

pub mod secure;
pub mod strategy;

pub use secure::SecureRedactionStrategy;
pub use strategy::{RedactedPdf, RedactionResult, RedactionStrategy};

use log::debug;

use crate::domain::Region;
use crate::error::ManagerResult;

/// A page with text geometry that can take redactions.
pub trait RedactablePage {
    /// Every region where `needle` is rendered on the page.
    fn locate(&self, needle: &str) -> ManagerResult<Vec<Region>>;

    /// Registers an opaque black redaction over `region`.
    fn mark(&mut self, region: Region) -> ManagerResult<()>;

    /// Applies every registered redaction, destroying the content beneath.
    fn commit(&mut self) -> ManagerResult<()>;
}

/// Redacts every on-page occurrence of each match, then commits once.
///
/// Matches that cannot be located are skipped silently, as are zero-area
/// regions. Returns the number of regions redacted.
pub fn apply_redactions<'m, P, I>(page: &mut P, matches: I) -> ManagerResult<usize>
where
    P: RedactablePage + ?Sized,
    I: IntoIterator<Item = &'m str>,
{
    let mut marked = 0;
    for found in matches {
        if found.is_empty() {
            continue;
        }
        let regions = page.locate(found)?;
        if regions.is_empty() {
            debug!("No on-page position for '{}'", found);
        }
        for region in regions.into_iter().filter(|region| !region.is_empty()) {
            page.mark(region)?;
            marked += 1;
        }
    }

    if marked > 0 {
        page.commit()?;
    }
    Ok(marked)
}

//! Top-level configuration for a [`PdfManager`](crate::PdfManager).

use std::path::PathBuf;

/// Clockwise rotation applied when a caller does not choose an angle.
pub const DEFAULT_ROTATION: i64 = 90;

/// JPEG quality used by `shrink` when a caller does not choose one.
pub const DEFAULT_SHRINK_QUALITY: u8 = 10;

/// Output file name used by `save` when no path is given.
pub const DEFAULT_OUTPUT: &str = "output.pdf";

/// Settings shared by every operation of a manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    /// Maximum number of on-page hits located per matched string and page.
    pub max_hits: u32,

    /// Nominal resolution used to lay out pages built from images.
    pub image_dpi: f32,

    /// Path written by `save` when the caller passes none.
    pub default_output: PathBuf,

    /// Whether `save` replaces the live collection with the merged document.
    pub collapse_on_save: bool,
}

impl ManagerConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self {
            max_hits: 500,
            image_dpi: 100.0,
            default_output: PathBuf::from(DEFAULT_OUTPUT),
            collapse_on_save: false,
        }
    }

    /// Sets the maximum number of search hits per matched string.
    pub fn with_max_hits(mut self, max_hits: u32) -> Self {
        self.max_hits = max_hits;
        self
    }

    /// Sets the layout resolution for image-built documents.
    pub fn with_image_dpi(mut self, dpi: f32) -> Self {
        self.image_dpi = dpi;
        self
    }

    /// Sets the fallback output path for `save`.
    pub fn with_default_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_output = path.into();
        self
    }

    /// Makes `save` collapse the collection into the merged document.
    pub fn with_collapse_on_save(mut self, collapse: bool) -> Self {
        self.collapse_on_save = collapse;
        self
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new()
    }
}

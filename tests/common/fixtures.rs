//! Test fixtures and PDF builders.
//!
//! Text PDFs are built with printpdf, one `use_text` call per line so that
//! text extraction reports each line separately. Image PDFs are built with
//! lopdf directly so the stream layout is known.

use anyhow::Result;
use lopdf::{dictionary, Object, Stream};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Builder for creating test PDFs with custom content.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let pdf = TestPdfBuilder::new()
///     .with_line("AAA start")
///     .with_line("secret1")
///     .new_page()
///     .with_line("second page")
///     .build(Path::new("/tmp/test.pdf"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    pages: Vec<Vec<String>>,
    page_width: Mm,
    page_height: Mm,
}

impl TestPdfBuilder {
    /// Creates a builder for a single empty A4 page.
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            pages: vec![Vec::new()],
            page_width: Mm(210.0),  // A4 width
            page_height: Mm(297.0), // A4 height
        }
    }

    /// Sets the document title.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Adds a line of text to the current page.
    pub fn with_line(mut self, line: &str) -> Self {
        if let Some(page) = self.pages.last_mut() {
            page.push(line.to_string());
        }
        self
    }

    /// Adds several lines to the current page.
    pub fn with_lines(self, lines: &[&str]) -> Self {
        lines.iter().fold(self, |builder, line| builder.with_line(line))
    }

    /// Starts a new page; following lines go there.
    pub fn new_page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    /// Sets custom page dimensions in millimetres.
    pub fn with_dimensions(mut self, width: f32, height: f32) -> Self {
        self.page_width = Mm(width);
        self.page_height = Mm(height);
        self
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build(self, output_path: &Path) -> Result<PathBuf> {
        let (doc, page1, layer1) =
            PdfDocument::new(&self.title, self.page_width, self.page_height, "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        let mut targets = vec![(page1, layer1)];
        for _ in 1..self.pages.len() {
            targets.push(doc.add_page(self.page_width, self.page_height, "Layer 1"));
        }

        for ((page, layer), lines) in targets.into_iter().zip(&self.pages) {
            let current_layer = doc.get_page(page).get_layer(layer);
            for (i, line) in lines.iter().enumerate() {
                let y = self.page_height.0 - 30.0 - 10.0 * i as f32;
                current_layer.use_text(line.as_str(), 12.0, Mm(20.0), Mm(y), &font);
            }
        }

        doc.save(&mut BufWriter::new(fs::File::create(output_path)?))?;
        Ok(output_path.to_path_buf())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes a text PDF with one line per entry on a single page.
pub fn create_text_pdf(path: &Path, lines: &[&str]) -> Result<PathBuf> {
    TestPdfBuilder::new().with_lines(lines).build(path)
}

/// Writes a PDF with `pages` pages whose widths start at `first_width` mm and
/// grow by 10 mm per page, so page order survives any reshuffling.
pub fn create_numbered_pdf(path: &Path, first_width: f32, pages: usize) -> Result<PathBuf> {
    let mut builder = TestPdfBuilder::new();
    for n in 0..pages {
        if n > 0 {
            builder = builder.new_page();
        }
        builder = builder.with_line(&format!("page {}", n + 1));
    }
    // Pages share one size in printpdf's builder, so widen them with lopdf.
    builder.build(path)?;

    let mut doc = lopdf::Document::load(path)?;
    for (n, page_id) in doc.get_pages().into_values().enumerate() {
        let width_pt = mm_to_pt(first_width + 10.0 * n as f32);
        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        page.set(
            "MediaBox",
            vec![0.into(), 0.into(), Object::Real(width_pt), 842.into()],
        );
    }
    doc.save(path)?;
    Ok(path.to_path_buf())
}

/// Writes a single-page PDF holding one uncompressed RGB image of noise.
///
/// Noise defeats lossless compression, so any JPEG re-encode is smaller.
pub fn create_noise_image_pdf(path: &Path, width: u32, height: u32) -> Result<PathBuf> {
    let pixels = noise(width as usize * height as usize * 3);

    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        pixels,
    ));
    let content = format!("q {} 0 0 {} 0 0 cm /Im0 Do Q", width, height);
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), (width as i64).into(), (height as i64).into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![page_id.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(path.to_path_buf())
}

/// Writes a two-page PDF whose first page selects a font that is missing from
/// its resources. `second_page` is shown on page 2 in Helvetica.
pub fn create_missing_font_pdf(path: &Path, second_page: &str) -> Result<PathBuf> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let contents = [
        ("F9", "unresolved font"),
        ("F1", second_page),
    ];
    let mut kids = Vec::new();
    for (font, text) in contents {
        let stream = format!("BT /{} 12 Tf 72 700 Td ({}) Tj ET", font, text);
        let content_id = doc.add_object(Stream::new(dictionary! {}, stream.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(path.to_path_buf())
}

/// Writes a PNG of the given size filled with one colour.
pub fn create_png(path: &Path, width: u32, height: u32, rgb: [u8; 3]) -> Result<PathBuf> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(path.to_path_buf())
}

pub fn mm_to_pt(mm: f32) -> f32 {
    mm / 25.4 * 72.0
}

/// Deterministic pseudo-random bytes.
fn noise(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x2545_f491;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builder_pattern() {
        let builder = TestPdfBuilder::new()
            .with_title("Test")
            .with_line("one")
            .new_page()
            .with_line("two");

        assert_eq!(builder.title, "Test");
        assert_eq!(builder.pages.len(), 2);
    }

    #[test]
    fn test_create_numbered_pdf() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let pdf_path = create_numbered_pdf(&temp_dir.path().join("n.pdf"), 100.0, 3)?;

        let doc = lopdf::Document::load(&pdf_path)?;
        assert_eq!(doc.get_pages().len(), 3);
        Ok(())
    }

    #[test]
    fn test_noise_is_not_constant() {
        let bytes = noise(64);
        assert!(bytes.iter().any(|&b| b != bytes[0]));
    }
}

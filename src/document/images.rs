//! Documents composed from image files.

use std::path::Path;

use image::DynamicImage;
use log::debug;
use printpdf::{Image, ImageTransform, Mm, PdfDocument};

use super::Document;
use crate::error::{ManagerError, ManagerResult};

const MM_PER_INCH: f32 = 25.4;

impl Document {
    /// Builds one document with a page per image, in the order given.
    ///
    /// Each page has the size of its image laid out at `dpi`, so pixel
    /// dimensions and aspect ratio are kept.
    pub fn from_images<P: AsRef<Path>>(paths: &[P], dpi: f32) -> ManagerResult<Document> {
        if paths.is_empty() {
            return Err(ManagerError::invalid_input(
                "image_paths",
                "at least one image is required",
            ));
        }
        if dpi <= 0.0 {
            return Err(ManagerError::invalid_input("dpi", "must be positive"));
        }

        let images = paths
            .iter()
            .map(|path| open_image(path.as_ref()))
            .collect::<ManagerResult<Vec<_>>>()?;

        let (width, height) = page_size(&images[0], dpi);
        let (pdf, first_page, first_layer) = PdfDocument::new("Images", width, height, "Layer 1");
        let mut targets = vec![(first_page, first_layer)];
        for image in &images[1..] {
            let (width, height) = page_size(image, dpi);
            targets.push(pdf.add_page(width, height, "Layer 1"));
        }

        for (image, (page, layer)) in images.iter().zip(targets) {
            let layer = pdf.get_page(page).get_layer(layer);
            Image::from_dynamic_image(image).add_to_layer(
                layer,
                ImageTransform {
                    dpi: Some(dpi),
                    ..Default::default()
                },
            );
        }

        let bytes = pdf
            .save_to_bytes()
            .map_err(|e| ManagerError::backend("printpdf", e))?;
        debug!("Composed {} image(s) into one document", images.len());
        Document::from_bytes(&bytes)
    }
}

/// Opens an image as 8-bit RGB, dropping any alpha channel.
fn open_image(path: &Path) -> ManagerResult<DynamicImage> {
    let image = image::open(path).map_err(|e| ManagerError::load(path, e))?;
    Ok(match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    })
}

fn page_size(image: &DynamicImage, dpi: f32) -> (Mm, Mm) {
    (
        Mm(image.width() as f32 / dpi * MM_PER_INCH),
        Mm(image.height() as f32 / dpi * MM_PER_INCH),
    )
}

//! Per-page transforms: rotation and image recompression.

use std::collections::BTreeSet;
use std::io::{Cursor, Read};

use flate2::read::ZlibDecoder;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb};
use log::{debug, warn};
use lopdf::{Object, ObjectId, Stream};

use super::assemble::{inherited_attribute, pin_inherited_attributes};
use super::{resolve, Document};
use crate::error::{ManagerError, ManagerResult};

impl Document {
    /// Rotates every page clockwise by `angle` degrees.
    ///
    /// PDF page rotation is limited to quarter turns, so `angle` must be a
    /// multiple of 90. The stored rotation is normalized into `0..360`.
    pub fn rotated(&self, angle: i64) -> ManagerResult<Document> {
        if angle % 90 != 0 {
            return Err(ManagerError::invalid_input(
                "angle",
                format!("{} is not a multiple of 90 degrees", angle),
            ));
        }

        let mut inner = self.inner.clone();
        pin_inherited_attributes(&mut inner);
        let turn = angle.rem_euclid(360);

        for page_id in inner.get_pages().into_values() {
            let dict = inner
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| ManagerError::backend("lopdf", e))?;
            let current = dict.get(b"Rotate").and_then(Object::as_i64).unwrap_or(0);
            dict.set("Rotate", (current + turn).rem_euclid(360));
        }

        Ok(Document {
            inner,
            source: self.source.clone(),
        })
    }

    /// Re-encodes every image placed on a page as JPEG at `quality`.
    ///
    /// Only 8-bit DeviceRGB and DeviceGray images that are unfiltered,
    /// Flate-compressed or already JPEG are touched. Text and vector content
    /// is left alone.
    pub fn shrunk(&self, quality: u8) -> ManagerResult<Document> {
        if quality > 100 {
            return Err(ManagerError::invalid_input(
                "quality",
                format!("{} is outside 0..=100", quality),
            ));
        }

        let mut inner = self.inner.clone();
        let mut recompressed = 0;

        for image_id in page_images(&inner) {
            let model = match inner.get_object(image_id) {
                Ok(Object::Stream(stream)) => stream
                    .dict
                    .get(b"ColorSpace")
                    .ok()
                    .and_then(|color_space| color_model(&inner, color_space)),
                _ => continue,
            };
            let Some(model) = model else {
                warn!("Left image {:?} untouched (unsupported colour space)", image_id);
                continue;
            };
            let Ok(Object::Stream(stream)) = inner.get_object_mut(image_id) else {
                continue;
            };
            match recompress(stream, model, quality) {
                Ok(true) => recompressed += 1,
                Ok(false) => warn!("Left image {:?} untouched (unsupported format)", image_id),
                Err(e) => warn!("Skipping image {:?} in '{}': {}", image_id, self.label(), e),
            }
        }
        debug!(
            "Recompressed {} image(s) in '{}' at quality {}",
            recompressed,
            self.label(),
            quality
        );

        Ok(Document {
            inner,
            source: self.source.clone(),
        })
    }
}

/// Ids of image streams reachable from page resources, forms included.
fn page_images(document: &lopdf::Document) -> BTreeSet<ObjectId> {
    let mut found = BTreeSet::new();
    let mut visited = BTreeSet::new();
    for page_id in document.get_pages().into_values() {
        if let Some(resources) = inherited_attribute(document, page_id, b"Resources") {
            collect_images(document, &resources, &mut found, &mut visited);
        }
    }
    found
}

fn collect_images(
    document: &lopdf::Document,
    resources: &Object,
    found: &mut BTreeSet<ObjectId>,
    visited: &mut BTreeSet<ObjectId>,
) {
    let Some(resources) = resolve(document, resources).and_then(|o| o.as_dict().ok()) else {
        return;
    };
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|o| resolve(document, o))
        .and_then(|o| o.as_dict().ok())
    else {
        return;
    };

    for (_, value) in xobjects.iter() {
        let Ok(id) = value.as_reference() else {
            continue;
        };
        if !visited.insert(id) {
            continue;
        }
        let Ok(Object::Stream(stream)) = document.get_object(id) else {
            continue;
        };
        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => {
                found.insert(id);
            }
            Ok(b"Form") => {
                if let Ok(inner) = stream.dict.get(b"Resources") {
                    collect_images(document, inner, found, visited);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColorModel {
    Rgb,
    Gray,
}

/// Colour model of an image colour space.
///
/// ICC-based spaces are classified by their component count, so RGB and
/// grayscale profiles are treated like their device counterparts.
fn color_model(document: &lopdf::Document, color_space: &Object) -> Option<ColorModel> {
    match resolve(document, color_space)? {
        Object::Name(name) => match name.as_slice() {
            b"DeviceRGB" => Some(ColorModel::Rgb),
            b"DeviceGray" => Some(ColorModel::Gray),
            _ => None,
        },
        Object::Array(family) => {
            let [kind, profile] = family.as_slice() else {
                return None;
            };
            if kind.as_name().ok()? != b"ICCBased" {
                return None;
            }
            let Object::Stream(profile) = resolve(document, profile)? else {
                return None;
            };
            let components = profile
                .dict
                .get(b"N")
                .ok()
                .and_then(|n| resolve(document, n))
                .and_then(|n| n.as_i64().ok())?;
            match components {
                3 => Some(ColorModel::Rgb),
                1 => Some(ColorModel::Gray),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Replaces the stream with a JPEG encoding. Returns false when unsupported.
///
/// The colour space object is kept as is; only the pixel data changes.
fn recompress(stream: &mut Stream, model: ColorModel, quality: u8) -> ManagerResult<bool> {
    let dict = &stream.dict;
    if dict.get(b"ImageMask").and_then(Object::as_bool).unwrap_or(false) {
        return Ok(false);
    }
    if dict.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8) != 8 {
        return Ok(false);
    }
    let (Ok(width), Ok(height)) = (
        dict.get(b"Width").and_then(Object::as_i64),
        dict.get(b"Height").and_then(Object::as_i64),
    ) else {
        return Ok(false);
    };
    let (width, height) = (width as u32, height as u32);

    let decoded = match single_filter(stream) {
        None => raw_image(stream.content.clone(), width, height, model)?,
        Some(filter) if filter == b"FlateDecode" => {
            if has_predictor(stream) {
                return Ok(false);
            }
            let mut data = Vec::new();
            ZlibDecoder::new(stream.content.as_slice())
                .read_to_end(&mut data)
                .map_err(|e| ManagerError::backend("flate2", e))?;
            raw_image(data, width, height, model)?
        }
        Some(filter) if filter == b"DCTDecode" => {
            image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|e| ManagerError::backend("image", e))?
        }
        Some(_) => return Ok(false),
    };

    let (pixels, color_type) = match model {
        ColorModel::Rgb => (decoded.to_rgb8().into_raw(), ColorType::Rgb8),
        ColorModel::Gray => (decoded.to_luma8().into_raw(), ColorType::L8),
    };

    let mut encoded = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut encoded, quality.max(1))
        .encode(&pixels, decoded.width(), decoded.height(), color_type)
        .map_err(|e| ManagerError::backend("image", e))?;

    stream.dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    stream.dict.set("BitsPerComponent", 8);
    stream.dict.remove(b"DecodeParms");
    stream.set_content(encoded.into_inner());
    stream.allows_compression = false;
    Ok(true)
}

/// PNG/TIFF predictors need un-filtering before the pixels are usable.
fn has_predictor(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"DecodeParms")
        .and_then(Object::as_dict)
        .and_then(|params| params.get(b"Predictor"))
        .and_then(Object::as_i64)
        .map_or(false, |predictor| predictor > 1)
}

/// The stream's only filter, if any. Filter chains are not supported.
fn single_filter(stream: &Stream) -> Option<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Err(_) => None,
        Ok(Object::Name(name)) => Some(name.clone()),
        Ok(Object::Array(filters)) if filters.is_empty() => None,
        Ok(Object::Array(filters)) if filters.len() == 1 => match &filters[0] {
            Object::Name(name) => Some(name.clone()),
            _ => Some(Vec::new()),
        },
        Ok(_) => Some(Vec::new()),
    }
}

fn raw_image(data: Vec<u8>, width: u32, height: u32, model: ColorModel) -> ManagerResult<DynamicImage> {
    let image = match model {
        ColorModel::Rgb => {
            ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
        }
        ColorModel::Gray => {
            ImageBuffer::<Luma<u8>, _>::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
    };
    image.ok_or_else(|| ManagerError::backend("image", "pixel data does not match image size"))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::document_with_widths;
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_rotation_accumulates_and_normalizes() {
        let document = document_with_widths(&[100, 200]);
        let once = document.rotated(90).unwrap();
        assert_eq!(once.page_rotations(), vec![90, 90]);
        let back = once.rotated(-180).unwrap();
        assert_eq!(back.page_rotations(), vec![270, 270]);
    }

    #[test]
    fn test_full_turn_is_identity() {
        let document = document_with_widths(&[100]);
        assert_eq!(
            document.rotated(360).unwrap().page_rotations(),
            document.rotated(0).unwrap().page_rotations()
        );
        assert_eq!(document.rotated(720).unwrap().page_rotations(), vec![0]);
    }

    #[test]
    fn test_rotation_rejects_partial_turns() {
        let document = document_with_widths(&[100]);
        let err = document.rotated(45).unwrap_err();
        assert!(matches!(err, ManagerError::InvalidInput { .. }));
    }

    #[test]
    fn test_quality_above_100_rejected() {
        let document = document_with_widths(&[100]);
        assert!(document.shrunk(101).is_err());
    }

    #[test]
    fn test_recompress_raw_rgb() {
        let (width, height) = (32u32, 32u32);
        let pixels: Vec<u8> = (0..width * height * 3).map(|i| (i * 37 % 251) as u8).collect();
        let mut stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            pixels,
        );
        assert!(recompress(&mut stream, ColorModel::Rgb, 10).unwrap());
        assert_eq!(
            stream.dict.get(b"Filter").and_then(Object::as_name).unwrap(),
            b"DCTDecode"
        );
        assert!(image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg).is_ok());
    }

    fn noisy_pixels(len: u32) -> Vec<u8> {
        (0..len).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8).collect()
    }

    fn jpeg_filter(stream: &Stream) -> bool {
        stream.dict.get(b"Filter").and_then(Object::as_name).ok() == Some(b"DCTDecode".as_slice())
    }

    #[test]
    fn test_recompress_flate_gray() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let (width, height) = (24u32, 16u32);
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&noisy_pixels(width * height)).unwrap();
        let mut stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            encoder.finish().unwrap(),
        );

        assert!(recompress(&mut stream, ColorModel::Gray, 10).unwrap());
        assert!(jpeg_filter(&stream));
        let decoded = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (width, height));
    }

    #[test]
    fn test_flate_with_predictor_untouched() {
        let mut stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
                "DecodeParms" => dictionary! { "Predictor" => 15 },
            },
            vec![1, 2, 3],
        );
        assert!(!recompress(&mut stream, ColorModel::Gray, 10).unwrap());
        assert_eq!(stream.content, vec![1, 2, 3]);
    }

    #[test]
    fn test_recompress_jpeg_at_lower_quality() {
        let (width, height) = (64u32, 64u32);
        let mut original = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut original, 95)
            .encode(&noisy_pixels(width * height * 3), width, height, ColorType::Rgb8)
            .unwrap();
        let original = original.into_inner();
        let mut stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            original.clone(),
        );

        assert!(recompress(&mut stream, ColorModel::Rgb, 5).unwrap());
        assert!(jpeg_filter(&stream));
        assert!(stream.content.len() < original.len());
    }

    #[test]
    fn test_color_models() {
        let mut document = lopdf::Document::with_version("1.5");
        let rgb_profile = document.add_object(Stream::new(dictionary! { "N" => 3 }, vec![]));
        let gray_profile = document.add_object(Stream::new(dictionary! { "N" => 1 }, vec![]));
        let cmyk_profile = document.add_object(Stream::new(dictionary! { "N" => 4 }, vec![]));
        let icc = |id: ObjectId| Object::Array(vec![Object::Name(b"ICCBased".to_vec()), id.into()]);

        let model = |space: &Object| color_model(&document, space);
        assert_eq!(model(&Object::Name(b"DeviceRGB".to_vec())), Some(ColorModel::Rgb));
        assert_eq!(model(&Object::Name(b"DeviceGray".to_vec())), Some(ColorModel::Gray));
        assert_eq!(model(&Object::Name(b"DeviceCMYK".to_vec())), None);
        assert_eq!(model(&icc(rgb_profile)), Some(ColorModel::Rgb));
        assert_eq!(model(&icc(gray_profile)), Some(ColorModel::Gray));
        assert_eq!(model(&icc(cmyk_profile)), None);
    }

    #[test]
    fn test_shrink_icc_image_keeps_color_space() {
        let (width, height) = (32u32, 32u32);
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let profile_id = doc.add_object(Stream::new(dictionary! { "N" => 3 }, vec![]));
        let color_space = Object::Array(vec![Object::Name(b"ICCBased".to_vec()), profile_id.into()]);
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => color_space.clone(),
                "BitsPerComponent" => 8,
            },
            noisy_pixels(width * height * 3),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 32.into(), 32.into()],
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
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let shrunk = Document::from_lopdf(doc).shrunk(10).unwrap();
        let Ok(Object::Stream(image)) = shrunk.lopdf().get_object(image_id) else {
            panic!("image stream missing");
        };
        assert!(jpeg_filter(image));
        assert_eq!(image.dict.get(b"ColorSpace").unwrap(), &color_space);
    }

    #[test]
    fn test_unsupported_color_space_untouched() {
        let document = document_with_widths(&[100]);
        let cmyk = Object::Name(b"DeviceCMYK".to_vec());
        assert_eq!(color_model(document.lopdf(), &cmyk), None);
    }
}

//! Image placements from the XObject `Do` operator, and lazy pixel decode.
//!
//! Image XObjects are painted into a 1×1 unit square that the CTM maps onto
//! the page. A placement keeps only a weak reference to its page, so pixels
//! can be decoded on request without keeping the page alive.

use std::sync::{Arc, Weak};

use crate::error::PdfError;
use crate::geometry::{Ctm, Point, Rectangle};
use crate::page_model::{ImageDescriptor, PageModel};
use crate::painting::{Color, ColorSpace};

/// PDF stream filter used to encode image data.
///
/// Maps to the `/Filter` entry in an image XObject stream dictionary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageFilter {
    /// JPEG compression (DCTDecode).
    DCTDecode,
    /// Flate (zlib/deflate) compression.
    FlateDecode,
    /// CCITT fax compression (Group 3 or 4).
    CCITTFaxDecode,
    /// JBIG2 compression.
    JBIG2Decode,
    /// JPEG 2000 compression (JPXDecode).
    JPXDecode,
    /// LZW compression.
    LZWDecode,
    /// Run-length encoding.
    RunLengthDecode,
    /// No filter, raw samples.
    #[default]
    Raw,
}

impl ImageFilter {
    /// Parse a PDF filter name (with or without the leading slash).
    pub fn from_pdf_name(name: &str) -> Self {
        match name.trim_start_matches('/') {
            "DCTDecode" | "DCT" => ImageFilter::DCTDecode,
            "FlateDecode" | "Fl" => ImageFilter::FlateDecode,
            "CCITTFaxDecode" | "CCF" => ImageFilter::CCITTFaxDecode,
            "JBIG2Decode" => ImageFilter::JBIG2Decode,
            "JPXDecode" => ImageFilter::JPXDecode,
            "LZWDecode" | "LZW" => ImageFilter::LZWDecode,
            "RunLengthDecode" | "RL" => ImageFilter::RunLengthDecode,
            _ => ImageFilter::Raw,
        }
    }
}

/// Page-space bounding box of the unit square mapped through `ctm`.
pub fn image_area_from_ctm(ctm: &Ctm) -> Rectangle {
    let corners = [
        ctm.transform_point(Point::new(0.0, 0.0)),
        ctm.transform_point(Point::new(1.0, 0.0)),
        ctm.transform_point(Point::new(0.0, 1.0)),
        ctm.transform_point(Point::new(1.0, 1.0)),
    ];
    Rectangle::enclosing(&corners)
}

/// An image painted on a page.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImagePlacement {
    /// Image id, matching [`ImageDescriptor::id`].
    pub id: u32,
    /// XObject resource name (e.g. "Im0").
    pub name: String,
    /// Page-space bounding box.
    pub area: Rectangle,
    #[cfg_attr(feature = "serde", serde(skip))]
    page: Weak<PageModel>,
}

impl PartialEq for ImagePlacement {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name && self.area == other.area
    }
}

impl ImagePlacement {
    pub fn new(id: u32, name: impl Into<String>, area: Rectangle) -> Self {
        Self {
            id,
            name: name.into(),
            area,
            page: Weak::new(),
        }
    }

    /// Attach the page the image was painted on (builder pattern).
    pub fn on_page(mut self, page: &Arc<PageModel>) -> Self {
        self.page = Arc::downgrade(page);
        self
    }

    /// Whether the owning page model is still alive.
    pub fn is_page_open(&self) -> bool {
        self.page.strong_count() > 0
    }

    /// Decode the image samples with `decoder`.
    ///
    /// Fails with [`PdfError::PageClosed`] once the page model was dropped.
    pub fn decode_with<D: ImageDecoder + ?Sized>(&self, decoder: &D) -> Result<Raster, PdfError> {
        let page = self.page.upgrade().ok_or(PdfError::PageClosed)?;
        let image = page.resources.find_image(self.id).ok_or_else(|| {
            PdfError::ImageDecode(format!("image {} not found in page resources", self.id))
        })?;
        decoder.decode(image)
    }
}

/// Decoded pixels, 8-bit RGB, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Turns an image XObject into pixels.
pub trait ImageDecoder {
    fn decode(&self, image: &ImageDescriptor) -> Result<Raster, PdfError>;
}

/// Decoder for unfiltered 8-bit images in DeviceGray, DeviceRGB, DeviceCMYK
/// or Indexed color spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawImageDecoder;

impl ImageDecoder for RawImageDecoder {
    fn decode(&self, image: &ImageDescriptor) -> Result<Raster, PdfError> {
        if image.filter != ImageFilter::Raw {
            return Err(PdfError::ImageDecode(format!(
                "unsupported filter {:?}",
                image.filter
            )));
        }
        if image.bits_per_component != 8 {
            return Err(PdfError::ImageDecode(format!(
                "unsupported bits per component {}",
                image.bits_per_component
            )));
        }
        let n = image.color_space.components();
        if n == 0 {
            return Err(PdfError::ImageDecode(format!(
                "unsupported color space {:?}",
                image.color_space
            )));
        }
        let pixels = image.width as usize * image.height as usize;
        let needed = pixels * n;
        if image.data.len() < needed {
            return Err(PdfError::ImageDecode(format!(
                "expected {needed} sample bytes, got {}",
                image.data.len()
            )));
        }

        let mut rgb = Vec::with_capacity(pixels * 3);
        for sample in image.data[..needed].chunks_exact(n) {
            let color = sample_color(&image.color_space, sample);
            rgb.extend_from_slice(&[to_byte(color.r), to_byte(color.g), to_byte(color.b)]);
        }
        Ok(Raster {
            width: image.width,
            height: image.height,
            rgb,
        })
    }
}

fn sample_color(cs: &ColorSpace, sample: &[u8]) -> Color {
    let comps: Vec<f64> = match cs {
        // palette indices are not normalized
        ColorSpace::Indexed { .. } => sample.iter().map(|&b| f64::from(b)).collect(),
        _ => sample.iter().map(|&b| f64::from(b) / 255.0).collect(),
    };
    cs.resolve(&comps).unwrap_or_default()
}

fn to_byte(v: f64) -> u8 {
    (v * 255.0).round() as u8
}

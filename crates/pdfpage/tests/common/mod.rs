//! Shared fixtures: hand-built page models and small PDFs written with lopdf.

#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use pdfpage::{ColorSpace, FontDescriptor, ImageDescriptor, ImageFilter, ResourceTable};

/// F1: widths H = 10 and i = 6, 500 for every other printable ASCII code.
pub fn hi_font() -> FontDescriptor {
    let mut widths = vec![500.0; 127 - 32];
    widths[usize::from(b'H' - 32)] = 10.0;
    widths[usize::from(b'i' - 32)] = 6.0;
    FontDescriptor::new("F1").with_widths(32, widths)
}

/// 2x1 DeviceRGB image: one red pixel, one blue pixel.
pub fn rgb_image(id: u32) -> ImageDescriptor {
    ImageDescriptor {
        id,
        width: 2,
        height: 1,
        bits_per_component: 8,
        color_space: ColorSpace::DeviceRgb,
        filter: ImageFilter::Raw,
        data: vec![255, 0, 0, 0, 0, 255],
    }
}

pub fn resources() -> ResourceTable {
    ResourceTable::new()
        .with_font("F1", hi_font())
        .with_image("Im0", rgb_image(1))
}

/// Builder for small PDFs sharing one Helvetica-like font and one image.
pub struct PdfBuilder {
    pub doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    pub font_id: ObjectId,
    pub image_id: ObjectId,
    catalog_extra: Dictionary,
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let widths: Vec<Object> = (32..127)
            .map(|c| Object::Integer(if c == i64::from(b'i') { 222 } else { 556 }))
            .collect();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "FirstChar" => 32,
            "LastChar" => 126,
            "Widths" => widths,
            "Encoding" => "WinAnsiEncoding",
        });
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![255, 0, 0, 0, 0, 255],
        ));
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            font_id,
            image_id,
            catalog_extra: Dictionary::new(),
        }
    }

    /// Add a page with `content`, the shared font as F1 and the image as Im0.
    pub fn page(self, content: &str) -> Self {
        self.page_with(content, Dictionary::new())
    }

    /// Add a page; `extra` entries (e.g. `/Dur`, `/Rotate`) go into the page
    /// dictionary.
    pub fn page_with(mut self, content: &str, extra: Dictionary) -> Self {
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => self.font_id },
                "XObject" => dictionary! { "Im0" => self.image_id },
            },
        };
        for (key, value) in extra.iter() {
            page.set(key.clone(), value.clone());
        }
        let page_id = self.doc.add_object(page);
        self.page_ids.push(page_id);
        self
    }

    /// Set a catalog entry such as `/PageLabels`.
    pub fn catalog(mut self, key: &str, value: Object) -> Self {
        self.catalog_extra.set(key, value);
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        };
        for (key, value) in self.catalog_extra.iter() {
            catalog.set(key.clone(), value.clone());
        }
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        self.doc.save_to(&mut buf).unwrap();
        buf
    }
}

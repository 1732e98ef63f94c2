//! The resolved page object model consumed by the interpreter.
//!
//! A [`PageModel`] is produced once per page by a loader (see
//! `pdfpage_parse::lopdf_backend`) or built by hand, and is immutable
//! afterwards. Resources are shared through [`Arc`] so that pages can be
//! interpreted on several threads at once.

use std::collections::HashMap;
use std::sync::Arc;

use crate::encoding::FontEncoding;
use crate::geometry::{Ctm, Rectangle};
use crate::images::ImageFilter;
use crate::painting::ColorSpace;

/// Font flags relevant to text attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontFlags {
    /// The font is meant to be drawn with an underline.
    pub underline: bool,
    pub bold: bool,
    pub italic: bool,
}

/// Number of bytes per character code in a shown string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CodeWidth {
    /// Simple fonts: one byte per code.
    #[default]
    OneByte,
    /// Composite (Type0) fonts with an Identity CMap: two bytes per code.
    TwoByte,
}

/// Opaque handle to an embedded font program.
///
/// The interpreter never looks inside; a rendering backend may.
#[derive(Debug, Clone, PartialEq)]
pub struct FontProgram(pub Arc<[u8]>);

/// A font resource: widths, metrics and the code-to-Unicode mapping.
///
/// Widths are in glyph space (1/1000 of the font size).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontDescriptor {
    /// Resource name the font was registered under (e.g. "F1").
    pub name: String,
    /// `/BaseFont`, possibly with a subset prefix.
    pub base_font: Option<String>,
    /// Code of the first entry in `widths`.
    pub first_char: u32,
    pub widths: Vec<f64>,
    /// Widths of composite fonts, keyed by CID.
    pub cid_widths: HashMap<u32, f64>,
    /// Advance for codes outside `widths`.
    pub missing_width: f64,
    pub flags: FontFlags,
    pub ascent: f64,
    pub descent: f64,
    pub encoding: Option<FontEncoding>,
    /// `/ToUnicode` mappings.
    pub to_unicode: HashMap<u32, String>,
    pub code_width: CodeWidth,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub program: Option<FontProgram>,
}

impl FontDescriptor {
    /// Create a font with no widths and default metrics.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_font: None,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            missing_width: 0.0,
            flags: FontFlags::default(),
            ascent: 750.0,
            descent: -250.0,
            encoding: None,
            to_unicode: HashMap::new(),
            code_width: CodeWidth::OneByte,
            program: None,
        }
    }

    /// Font substituted when `Tf` names a font that does not exist.
    ///
    /// Every glyph of the fallback font has a zero advance.
    pub fn fallback(name: impl Into<String>) -> Self {
        Self::new(name)
    }

    /// Set the width table starting at `first_char` (builder pattern).
    pub fn with_widths(mut self, first_char: u32, widths: Vec<f64>) -> Self {
        self.first_char = first_char;
        self.widths = widths;
        self
    }

    /// Set `/BaseFont` (builder pattern).
    pub fn with_base_font(mut self, base_font: impl Into<String>) -> Self {
        self.base_font = Some(base_font.into());
        self
    }

    /// Set the font flags (builder pattern).
    pub fn with_flags(mut self, flags: FontFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Advance width of `code` in glyph space.
    pub fn advance(&self, code: u32) -> f64 {
        match self.code_width {
            CodeWidth::TwoByte => self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.missing_width),
            CodeWidth::OneByte => code
                .checked_sub(self.first_char)
                .and_then(|i| self.widths.get(i as usize))
                .copied()
                .unwrap_or(self.missing_width),
        }
    }

    /// Name reported in text attributes: `/BaseFont` without its subset
    /// prefix, or the resource name when there is no base font.
    pub fn display_name(&self) -> &str {
        match self.base_font.as_deref() {
            Some(base) => strip_subset_prefix(base),
            None => &self.name,
        }
    }
}

/// Strip a `ABCDEF+` subset tag from a font name.
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

/// An image XObject.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageDescriptor {
    /// Identifier, stable within a page (the object number for loaded PDFs).
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub color_space: ColorSpace,
    pub filter: ImageFilter,
    /// Stream data, still encoded with `filter`.
    pub data: Vec<u8>,
}

/// A form XObject: a nested content stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormXObject {
    pub content: Vec<u8>,
    /// `/Matrix`, mapping form space to the user space of the caller.
    pub matrix: Ctm,
    pub bbox: Option<Rectangle>,
    /// The form's own resources; `None` means the enclosing scope is used.
    pub resources: Option<Arc<ResourceTable>>,
}

impl FormXObject {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            matrix: Ctm::identity(),
            bbox: None,
            resources: None,
        }
    }
}

/// Entry of a resource table's `/XObject` dictionary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum XObject {
    Image(Arc<ImageDescriptor>),
    Form(Arc<FormXObject>),
}

/// Named resources of a page or form, with an optional inherited table.
///
/// Lookups check this table first and then walk the inherited chain; the
/// first match wins.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceTable {
    pub fonts: HashMap<String, Arc<FontDescriptor>>,
    pub xobjects: HashMap<String, XObject>,
    pub color_spaces: HashMap<String, ColorSpace>,
    pub inherited: Option<Arc<ResourceTable>>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the table to fall back to (builder pattern).
    pub fn with_inherited(mut self, parent: Arc<ResourceTable>) -> Self {
        self.inherited = Some(parent);
        self
    }

    /// Register a font under `name` (builder pattern).
    pub fn with_font(mut self, name: impl Into<String>, font: FontDescriptor) -> Self {
        self.fonts.insert(name.into(), Arc::new(font));
        self
    }

    /// Register an image XObject under `name` (builder pattern).
    pub fn with_image(mut self, name: impl Into<String>, image: ImageDescriptor) -> Self {
        self.xobjects
            .insert(name.into(), XObject::Image(Arc::new(image)));
        self
    }

    /// Register a form XObject under `name` (builder pattern).
    pub fn with_form(mut self, name: impl Into<String>, form: FormXObject) -> Self {
        self.xobjects.insert(name.into(), XObject::Form(Arc::new(form)));
        self
    }

    /// Register a named color space (builder pattern).
    pub fn with_color_space(mut self, name: impl Into<String>, cs: ColorSpace) -> Self {
        self.color_spaces.insert(name.into(), cs);
        self
    }

    pub fn font(&self, name: &str) -> Option<&Arc<FontDescriptor>> {
        self.fonts
            .get(name)
            .or_else(|| self.inherited.as_deref()?.font(name))
    }

    pub fn xobject(&self, name: &str) -> Option<&XObject> {
        self.xobjects
            .get(name)
            .or_else(|| self.inherited.as_deref()?.xobject(name))
    }

    pub fn color_space(&self, name: &str) -> Option<&ColorSpace> {
        self.color_spaces
            .get(name)
            .or_else(|| self.inherited.as_deref()?.color_space(name))
    }

    /// Find an image by id anywhere in this table, in nested form
    /// resources, or in the inherited chain.
    pub fn find_image(&self, id: u32) -> Option<&Arc<ImageDescriptor>> {
        for xobj in self.xobjects.values() {
            match xobj {
                XObject::Image(img) if img.id == id => return Some(img),
                XObject::Form(form) => {
                    if let Some(found) = form.resources.as_deref().and_then(|r| r.find_image(id)) {
                        return Some(found);
                    }
                }
                XObject::Image(_) => {}
            }
        }
        self.inherited.as_deref()?.find_image(id)
    }
}

/// A resolved page: geometry, identity, resources and content.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageModel {
    /// Page width and height in points.
    pub size: (f64, f64),
    /// 0-based page index.
    pub index: usize,
    /// Page label (`/PageLabels`), or the 1-based page number.
    pub label: String,
    /// Display duration in seconds (`/Dur`), if any.
    pub duration: Option<f64>,
    pub media_box: Rectangle,
    /// `/Rotate` in degrees. Layout is reported in unrotated page space.
    pub rotation: i32,
    pub resources: Arc<ResourceTable>,
    /// Decoded content stream bytes.
    pub content: Vec<u8>,
}

impl PageModel {
    /// Create a page with a media box of `width` x `height` at the origin.
    pub fn new(index: usize, width: f64, height: f64, content: impl Into<Vec<u8>>) -> Self {
        Self {
            size: (width, height),
            index,
            label: (index + 1).to_string(),
            duration: None,
            media_box: Rectangle::new(0.0, 0.0, width, height),
            rotation: 0,
            resources: Arc::new(ResourceTable::new()),
            content: content.into(),
        }
    }

    /// Set the resources (builder pattern).
    pub fn with_resources(mut self, resources: ResourceTable) -> Self {
        self.resources = Arc::new(resources);
        self
    }

    /// Set the page label (builder pattern).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the display duration (builder pattern).
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Set the media box; the page size follows it (builder pattern).
    pub fn with_media_box(mut self, media_box: Rectangle) -> Self {
        self.size = (media_box.width(), media_box.height());
        self.media_box = media_box;
        self
    }

    /// Set `/Rotate` (builder pattern).
    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation = degrees.rem_euclid(360);
        self
    }

    pub fn width(&self) -> f64 {
        self.size.0
    }

    pub fn height(&self) -> f64 {
        self.size.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: u32) -> ImageDescriptor {
        ImageDescriptor {
            id,
            width: 2,
            height: 1,
            bits_per_component: 8,
            color_space: ColorSpace::DeviceGray,
            filter: ImageFilter::Raw,
            data: vec![0, 255],
        }
    }

    // --- FontDescriptor ---

    #[test]
    fn advance_from_width_table() {
        let font = FontDescriptor::new("F1").with_widths(72, vec![10.0, 20.0]);
        assert_eq!(font.advance(72), 10.0);
        assert_eq!(font.advance(73), 20.0);
        assert_eq!(font.advance(74), 0.0);
        assert_eq!(font.advance(10), 0.0);
    }

    #[test]
    fn advance_uses_missing_width() {
        let mut font = FontDescriptor::new("F1");
        font.missing_width = 600.0;
        assert_eq!(font.advance(65), 600.0);
    }

    #[test]
    fn two_byte_advance_uses_cid_widths() {
        let mut font = FontDescriptor::new("F0");
        font.code_width = CodeWidth::TwoByte;
        font.cid_widths.insert(0x0102, 1000.0);
        font.missing_width = 500.0;
        assert_eq!(font.advance(0x0102), 1000.0);
        assert_eq!(font.advance(0x0103), 500.0);
    }

    #[test]
    fn fallback_font_has_zero_advance() {
        let font = FontDescriptor::fallback("F9");
        assert_eq!(font.advance(b'A' as u32), 0.0);
        assert_eq!(font.display_name(), "F9");
    }

    #[test]
    fn display_name_strips_subset_prefix() {
        let font = FontDescriptor::new("F1").with_base_font("ABCDEF+Helvetica");
        assert_eq!(font.display_name(), "Helvetica");
        let font = FontDescriptor::new("F1").with_base_font("Times+Roman");
        assert_eq!(font.display_name(), "Times+Roman");
        assert_eq!(FontDescriptor::new("F1").display_name(), "F1");
    }

    // --- ResourceTable ---

    #[test]
    fn lookup_prefers_local_then_inherited() {
        let parent = Arc::new(
            ResourceTable::new()
                .with_font("F1", FontDescriptor::new("parent"))
                .with_font("F2", FontDescriptor::new("parent-only")),
        );
        let child = ResourceTable::new()
            .with_font("F1", FontDescriptor::new("child"))
            .with_inherited(parent);
        assert_eq!(child.font("F1").unwrap().name, "child");
        assert_eq!(child.font("F2").unwrap().name, "parent-only");
        assert!(child.font("F3").is_none());
    }

    #[test]
    fn color_space_lookup_walks_chain() {
        let parent = Arc::new(ResourceTable::new().with_color_space("CS0", ColorSpace::DeviceCmyk));
        let child = ResourceTable::new().with_inherited(parent);
        assert_eq!(child.color_space("CS0"), Some(&ColorSpace::DeviceCmyk));
    }

    #[test]
    fn find_image_searches_forms() {
        let inner = ResourceTable::new().with_image("Im1", image(7));
        let mut form = FormXObject::new(b"/Im1 Do".to_vec());
        form.resources = Some(Arc::new(inner));
        let table = ResourceTable::new()
            .with_image("Im0", image(3))
            .with_form("Fm0", form);
        assert_eq!(table.find_image(3).unwrap().id, 3);
        assert_eq!(table.find_image(7).unwrap().id, 7);
        assert!(table.find_image(9).is_none());
    }

    // --- PageModel ---

    #[test]
    fn new_page_defaults() {
        let page = PageModel::new(2, 612.0, 792.0, b"q Q".to_vec());
        assert_eq!(page.size, (612.0, 792.0));
        assert_eq!(page.label, "3");
        assert_eq!(page.duration, None);
        assert_eq!(page.rotation, 0);
        assert_eq!(page.media_box, Rectangle::new(0.0, 0.0, 612.0, 792.0));
    }

    #[test]
    fn media_box_sets_size() {
        let page = PageModel::new(0, 1.0, 1.0, Vec::new())
            .with_media_box(Rectangle::new(10.0, 10.0, 210.0, 110.0))
            .with_rotation(-90);
        assert_eq!(page.size, (200.0, 100.0));
        assert_eq!(page.rotation, 270);
    }
}

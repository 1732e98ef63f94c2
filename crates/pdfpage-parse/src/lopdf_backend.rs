//! lopdf-based page loader.
//!
//! Builds [`PageModel`]s from a parsed [`lopdf::Document`]: page geometry
//! with page-tree inheritance, page labels, decoded content streams, and
//! resource tables with fonts, images, form XObjects and color spaces.
//! File parsing and stream decompression are left to
//! [lopdf](https://crates.io/crates/lopdf).

use std::collections::HashMap;
use std::sync::Arc;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfpage_core::{
    CodeWidth, ColorSpace, Ctm, FontDescriptor, FontEncoding, FontFlags, FontProgram, FormXObject,
    ImageDescriptor, ImageFilter, PageModel, PdfError, Rectangle, ResourceTable, StandardEncoding,
    XObject,
};
use tracing::{debug, warn};

use crate::cmap::parse_to_unicode;
use crate::color_space::resolve_color_space_object;
use crate::error::BackendError;

/// US Letter, used when no `/MediaBox` is found anywhere in the page tree.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Advance for simple fonts that carry no `/Widths`.
const DEFAULT_SIMPLE_WIDTH: f64 = 600.0;

/// `/DW` default for composite fonts.
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// Parent links followed before giving up on an inherited attribute.
const MAX_TREE_DEPTH: usize = 64;

/// Largest label value written as a roman numeral; larger values are decimal.
const MAX_ROMAN_LABEL: u32 = 3999;

/// Largest label value written as letters (26 repeats of Z).
const MAX_LETTER_LABEL: u32 = 26 * 26;

/// `/St` values are clamped to this range.
const MAX_LABEL_START: f64 = u32::MAX as f64;

// FontDescriptor /Flags bits
const FLAG_ITALIC: i64 = 1 << 6;
const FLAG_FORCE_BOLD: i64 = 1 << 18;

/// Parse a PDF file.
///
/// Encrypted documents are rejected; decryption is not supported.
pub fn load_document(bytes: &[u8]) -> Result<Document, BackendError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;
    if doc.is_encrypted() {
        return Err(BackendError::Parse(
            "encrypted documents are not supported".to_string(),
        ));
    }
    Ok(doc)
}

/// Build the model of every page, in page order.
pub fn page_models(doc: &Document) -> Result<Vec<PageModel>, BackendError> {
    PageLoader::new(doc).load_all()
}

/// Build the model of the page at `index`.
pub fn page_model(doc: &Document, index: usize) -> Result<PageModel, BackendError> {
    PageLoader::new(doc).load(index)
}

/// Page object ids and labels of a document.
///
/// Walking the page tree and the `/PageLabels` number tree touches every
/// page, so this is computed once and shared by the loaders of a document.
#[derive(Debug, Clone)]
pub struct PageIndex {
    page_ids: Arc<[ObjectId]>,
    labels: Arc<[String]>,
}

impl PageIndex {
    pub fn new(doc: &Document) -> Self {
        let page_ids: Arc<[ObjectId]> = doc.get_pages().values().copied().collect();
        let labels = page_labels(doc, page_ids.len()).into();
        Self { page_ids, labels }
    }

    pub fn len(&self) -> usize {
        self.page_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page_ids.is_empty()
    }

    /// Label of page `index`.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }
}

/// Page model builder sharing parsed fonts, images and forms across the
/// pages of one document.
pub struct PageLoader<'d> {
    doc: &'d Document,
    index: PageIndex,
    fonts: HashMap<(ObjectId, String), Arc<FontDescriptor>>,
    images: HashMap<ObjectId, Arc<ImageDescriptor>>,
    forms: HashMap<ObjectId, Arc<FormXObject>>,
    /// Resource dictionaries and forms being built, innermost last.
    building: Vec<ObjectId>,
    next_direct_id: u32,
}

impl<'d> PageLoader<'d> {
    pub fn new(doc: &'d Document) -> Self {
        Self::with_index(doc, PageIndex::new(doc))
    }

    /// Loader over a page index computed earlier for `doc`.
    pub fn with_index(doc: &'d Document, index: PageIndex) -> Self {
        Self {
            doc,
            index,
            fonts: HashMap::new(),
            images: HashMap::new(),
            forms: HashMap::new(),
            building: Vec::new(),
            next_direct_id: doc.max_id.saturating_add(1),
        }
    }

    pub fn page_count(&self) -> usize {
        self.index.len()
    }

    pub fn load_all(&mut self) -> Result<Vec<PageModel>, BackendError> {
        (0..self.index.len()).map(|i| self.load(i)).collect()
    }

    /// Build the model of page `index`.
    pub fn load(&mut self, index: usize) -> Result<PageModel, BackendError> {
        let page_id = *self.index.page_ids.get(index).ok_or(PdfError::PageIndexOutOfRange {
            index,
            count: self.index.len(),
        })?;
        let doc = self.doc;
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;

        let media_box = inherited(doc, page_id, b"MediaBox")
            .and_then(|o| rect_from(doc, o))
            .unwrap_or_else(|| {
                debug!(page = index, "no MediaBox, using US Letter");
                let [x1, y1, x2, y2] = DEFAULT_MEDIA_BOX;
                Rectangle::new(x1, y1, x2, y2)
            });
        let rotation = inherited(doc, page_id, b"Rotate")
            .and_then(|o| number(doc, o))
            .unwrap_or(0.0) as i32;

        let resources = match inherited(doc, page_id, b"Resources") {
            Some(obj) => self.resource_table(obj),
            None => ResourceTable::new(),
        };
        let content = page_content(doc, page, index);

        let mut model = PageModel::new(index, media_box.width(), media_box.height(), content)
            .with_media_box(media_box)
            .with_rotation(rotation)
            .with_resources(resources);
        if let Some(label) = self.index.label(index) {
            model = model.with_label(label);
        }
        if let Some(dur) = page.get(b"Dur").ok().and_then(|o| number(doc, o)) {
            model = model.with_duration(dur);
        }
        Ok(model)
    }

    // --- resources ---

    /// Resource table for a `/Resources` entry (dictionary or reference).
    fn resource_table(&mut self, obj: &Object) -> ResourceTable {
        let doc = self.doc;
        let guard = match obj {
            Object::Reference(id) => Some(*id),
            _ => None,
        };
        let Some(dict) = resolve(doc, obj).as_dict().ok() else {
            debug!("/Resources is not a dictionary");
            return ResourceTable::new();
        };

        if let Some(id) = guard {
            self.building.push(id);
        }
        let mut table = ResourceTable::new();

        if let Some(fonts) = sub_dict(doc, dict, b"Font") {
            for (name, font_obj) in fonts.iter() {
                let name = String::from_utf8_lossy(name).into_owned();
                if let Some(font) = self.font(&name, font_obj) {
                    table.fonts.insert(name, font);
                }
            }
        }

        if let Some(xobjects) = sub_dict(doc, dict, b"XObject") {
            for (name, xobj) in xobjects.iter() {
                let name = String::from_utf8_lossy(name).into_owned();
                if let Some(xobject) = self.xobject(&name, xobj) {
                    table.xobjects.insert(name, xobject);
                }
            }
        }

        if let Some(spaces) = sub_dict(doc, dict, b"ColorSpace") {
            for (name, cs_obj) in spaces.iter() {
                let name = String::from_utf8_lossy(name).into_owned();
                let cs = resolve_color_space_object(cs_obj, doc)
                    .unwrap_or_else(|| ColorSpace::Unsupported(name.clone()));
                table.color_spaces.insert(name, cs);
            }
        }

        if guard.is_some() {
            self.building.pop();
        }
        table
    }

    fn xobject(&mut self, name: &str, obj: &Object) -> Option<XObject> {
        let doc = self.doc;
        let id = match obj {
            Object::Reference(id) => Some(*id),
            _ => None,
        };
        let stream = resolve(doc, obj).as_stream().ok()?;
        match name_of(stream.dict.get(b"Subtype").ok()?)?.as_str() {
            "Image" => Some(XObject::Image(self.image(id, stream))),
            "Form" => {
                if let Some(id) = id {
                    if let Some(form) = self.forms.get(&id) {
                        return Some(XObject::Form(Arc::clone(form)));
                    }
                    if self.building.contains(&id) {
                        debug!(xobject = name, "form refers to itself, entry dropped");
                        return None;
                    }
                    self.building.push(id);
                }
                let form = Arc::new(self.form(stream));
                if let Some(id) = id {
                    self.building.pop();
                    self.forms.insert(id, Arc::clone(&form));
                }
                Some(XObject::Form(form))
            }
            other => {
                debug!(xobject = name, subtype = other, "unsupported XObject subtype");
                None
            }
        }
    }

    fn image(&mut self, id: Option<ObjectId>, stream: &lopdf::Stream) -> Arc<ImageDescriptor> {
        if let Some(image) = id.and_then(|id| self.images.get(&id)) {
            return Arc::clone(image);
        }
        let doc = self.doc;
        let dict = &stream.dict;
        let int = |key: &[u8]| dict.get(key).ok().and_then(|o| number(doc, o));

        let image_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
        let bits_per_component = if image_mask {
            1
        } else {
            int(b"BitsPerComponent").unwrap_or(8.0) as u8
        };
        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| resolve_color_space_object(o, doc))
            .unwrap_or(ColorSpace::DeviceGray);

        let filter = first_filter(doc, dict);
        let (filter, data) = match filter {
            // image codecs stay encoded for an ImageDecoder
            ImageFilter::DCTDecode
            | ImageFilter::JPXDecode
            | ImageFilter::JBIG2Decode
            | ImageFilter::CCITTFaxDecode => (filter, stream.content.clone()),
            ImageFilter::Raw => (filter, stream.content.clone()),
            _ => match stream.decompressed_content() {
                Ok(data) => (ImageFilter::Raw, data),
                Err(e) => {
                    debug!(error = %e, "image stream left encoded");
                    (filter, stream.content.clone())
                }
            },
        };

        let image_id = match id {
            Some((number, _)) => number,
            None => {
                let direct = self.next_direct_id;
                self.next_direct_id = self.next_direct_id.saturating_add(1);
                direct
            }
        };
        let image = Arc::new(ImageDescriptor {
            id: image_id,
            width: int(b"Width").unwrap_or(0.0) as u32,
            height: int(b"Height").unwrap_or(0.0) as u32,
            bits_per_component,
            color_space,
            filter,
            data,
        });
        if let Some(id) = id {
            self.images.insert(id, Arc::clone(&image));
        }
        image
    }

    fn form(&mut self, stream: &lopdf::Stream) -> FormXObject {
        let doc = self.doc;
        let dict = &stream.dict;
        let mut form = FormXObject::new(decode_stream(stream).unwrap_or_default());

        if let Some(m) = dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| numbers(doc, o))
            .filter(|m| m.len() == 6)
        {
            form.matrix = Ctm::new(m[0], m[1], m[2], m[3], m[4], m[5]);
        }
        form.bbox = dict.get(b"BBox").ok().and_then(|o| rect_from(doc, o));

        form.resources = match dict.get(b"Resources") {
            // the enclosing resources again: inherit instead of copying
            Ok(Object::Reference(id)) if self.building.contains(id) => None,
            Ok(obj) => Some(Arc::new(self.resource_table(obj))),
            Err(_) => None,
        };
        form
    }

    // --- fonts ---

    fn font(&mut self, name: &str, obj: &Object) -> Option<Arc<FontDescriptor>> {
        let doc = self.doc;
        let key = match obj {
            Object::Reference(id) => Some((*id, name.to_string())),
            _ => None,
        };
        if let Some(font) = key.as_ref().and_then(|k| self.fonts.get(k)) {
            return Some(Arc::clone(font));
        }
        let Some(dict) = resolve(doc, obj).as_dict().ok() else {
            debug!(font = name, "font entry is not a dictionary");
            return None;
        };
        let font = Arc::new(load_font(doc, name, dict));
        if let Some(key) = key {
            self.fonts.insert(key, Arc::clone(&font));
        }
        Some(font)
    }
}

/// Build a font descriptor from a font dictionary.
pub fn load_font(doc: &Document, name: &str, dict: &Dictionary) -> FontDescriptor {
    let mut font = FontDescriptor::new(name);
    font.base_font = dict.get(b"BaseFont").ok().and_then(name_of);
    let subtype = dict.get(b"Subtype").ok().and_then(name_of).unwrap_or_default();

    let descriptor = if subtype == "Type0" {
        font.code_width = CodeWidth::TwoByte;
        let descendant = dict
            .get(b"DescendantFonts")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .and_then(|arr| arr.first())
            .and_then(|o| resolve(doc, o).as_dict().ok());
        if let Some(cid_font) = descendant {
            font.missing_width = cid_font
                .get(b"DW")
                .ok()
                .and_then(|o| number(doc, o))
                .unwrap_or(DEFAULT_CID_WIDTH);
            font.cid_widths = cid_font
                .get(b"W")
                .ok()
                .and_then(|o| resolve(doc, o).as_array().ok())
                .map(|arr| parse_w_array(doc, arr))
                .unwrap_or_default();
        } else {
            font.missing_width = DEFAULT_CID_WIDTH;
        }
        descendant.and_then(|d| sub_dict(doc, d, b"FontDescriptor"))
    } else {
        load_simple_widths(doc, dict, &subtype, &mut font);
        font.encoding = dict.get(b"Encoding").ok().and_then(|o| load_encoding(doc, o));
        sub_dict(doc, dict, b"FontDescriptor")
    };

    if let Some(desc) = descriptor {
        apply_descriptor(doc, desc, &mut font);
    }
    apply_name_style(&mut font);

    if let Some(stream) = dict
        .get(b"ToUnicode")
        .ok()
        .and_then(|o| resolve(doc, o).as_stream().ok())
    {
        match decode_stream(stream) {
            Some(data) => font.to_unicode = parse_to_unicode(&data),
            None => debug!(font = name, "unreadable ToUnicode stream"),
        }
    }
    font
}

/// `/FirstChar` + `/Widths`, scaled by `/FontMatrix` for Type3 fonts.
fn load_simple_widths(doc: &Document, dict: &Dictionary, subtype: &str, font: &mut FontDescriptor) {
    let first_char = dict
        .get(b"FirstChar")
        .ok()
        .and_then(|o| number(doc, o))
        .unwrap_or(0.0)
        .max(0.0) as u32;
    let widths = dict.get(b"Widths").ok().and_then(|o| {
        let arr = resolve(doc, o).as_array().ok()?;
        Some(
            arr.iter()
                .map(|w| number(doc, w).unwrap_or(0.0))
                .collect::<Vec<_>>(),
        )
    });

    match widths {
        Some(mut widths) => {
            if subtype == "Type3" {
                let scale = dict
                    .get(b"FontMatrix")
                    .ok()
                    .and_then(|o| numbers(doc, o))
                    .and_then(|m| m.first().copied())
                    .unwrap_or(0.001)
                    * 1000.0;
                widths.iter_mut().for_each(|w| *w *= scale);
            }
            font.first_char = first_char;
            font.widths = widths;
        }
        None => font.missing_width = DEFAULT_SIMPLE_WIDTH,
    }
}

/// `/Encoding` as a name or a dictionary with `/BaseEncoding` and
/// `/Differences`.
fn load_encoding(doc: &Document, obj: &Object) -> Option<FontEncoding> {
    match resolve(doc, obj) {
        Object::Name(n) => {
            StandardEncoding::from_name(&String::from_utf8_lossy(n)).map(FontEncoding::from_standard)
        }
        Object::Dictionary(dict) => {
            let base = dict
                .get(b"BaseEncoding")
                .ok()
                .and_then(name_of)
                .and_then(|n| StandardEncoding::from_name(&n))
                .unwrap_or(StandardEncoding::Standard);
            let mut encoding = FontEncoding::from_standard(base);
            if let Some(diffs) = dict
                .get(b"Differences")
                .ok()
                .and_then(|o| resolve(doc, o).as_array().ok())
            {
                encoding.apply_differences(&parse_differences(doc, diffs));
            }
            Some(encoding)
        }
        _ => None,
    }
}

/// `[code /name /name ... code /name ...]` to `(code, name)` pairs.
fn parse_differences(doc: &Document, diffs: &[Object]) -> Vec<(u8, String)> {
    let mut pairs = Vec::new();
    let mut code: Option<u32> = None;
    for item in diffs {
        match resolve(doc, item) {
            Object::Integer(n) => code = u32::try_from(*n).ok(),
            Object::Name(glyph) => {
                if let Some(c) = code {
                    if let Ok(byte) = u8::try_from(c) {
                        pairs.push((byte, String::from_utf8_lossy(glyph).into_owned()));
                    }
                    code = Some(c + 1);
                }
            }
            _ => {}
        }
    }
    pairs
}

/// Composite font `/W`: `c [w1 w2 ...]` and `c_first c_last w` entries.
pub fn parse_w_array(doc: &Document, items: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < items.len() {
        let Some(start) = number(doc, &items[i]).map(|v| v as u32) else {
            i += 1;
            continue;
        };
        match items.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(ws)) => {
                for (offset, w) in ws.iter().enumerate() {
                    if let Some(w) = number(doc, w) {
                        widths.insert(start + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(end) => {
                let (Some(end), Some(w)) = (
                    number(doc, end).map(|v| v as u32),
                    items.get(i + 2).and_then(|o| number(doc, o)),
                ) else {
                    i += 3;
                    continue;
                };
                // clamp absurd ranges
                for cid in start..=end.min(start.saturating_add(0xFFFF)) {
                    widths.insert(cid, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// Ascent, descent, flags, `/MissingWidth` and the embedded program.
fn apply_descriptor(doc: &Document, desc: &Dictionary, font: &mut FontDescriptor) {
    let get = |key: &[u8]| desc.get(key).ok().and_then(|o| number(doc, o));

    if let Some(ascent) = get(b"Ascent").filter(|a| *a != 0.0) {
        font.ascent = ascent;
    }
    if let Some(descent) = get(b"Descent").filter(|d| *d != 0.0) {
        font.descent = descent;
    }
    if let Some(missing) = get(b"MissingWidth") {
        font.missing_width = missing;
    }
    if let Some(flags) = get(b"Flags") {
        let flags = flags as i64;
        font.flags.italic |= flags & FLAG_ITALIC != 0;
        font.flags.bold |= flags & FLAG_FORCE_BOLD != 0;
    }
    if get(b"FontWeight").is_some_and(|w| w >= 700.0) {
        font.flags.bold = true;
    }

    let program = [&b"FontFile"[..], b"FontFile2", b"FontFile3"]
        .iter()
        .find_map(|key| desc.get(key).ok())
        .and_then(|o| resolve(doc, o).as_stream().ok())
        .and_then(decode_stream);
    font.program = program.map(|bytes| FontProgram(Arc::from(bytes)));
}

/// Style hints carried in the base font name ("Arial-BoldItalic",
/// "Helvetica-Oblique", "Times-Underline").
fn apply_name_style(font: &mut FontDescriptor) {
    let name = font.display_name().to_ascii_lowercase();
    let mut flags: FontFlags = font.flags;
    flags.bold |= name.contains("bold") || name.contains("black") || name.contains("heavy");
    flags.italic |= name.contains("italic") || name.contains("oblique");
    flags.underline |= name.contains("underline");
    font.flags = flags;
}

// --- page tree ---

/// Look up `key` on the page, then on its `/Parent` chain.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_object(current).and_then(Object::as_dict).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    warn!("page tree deeper than {MAX_TREE_DEPTH} levels");
    None
}

/// Decoded `/Contents`: one stream, or an array of streams joined with a
/// space. Undecodable parts are skipped.
fn page_content(doc: &Document, page: &Dictionary, index: usize) -> Vec<u8> {
    let Ok(contents) = page.get(b"Contents") else {
        return Vec::new();
    };
    let parts: Vec<&Object> = match resolve(doc, contents) {
        Object::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let mut content = Vec::new();
    for part in parts {
        let Ok(stream) = resolve(doc, part).as_stream() else {
            debug!(page = index, "/Contents entry is not a stream");
            continue;
        };
        match decode_stream(stream) {
            Some(bytes) => {
                if !content.is_empty() {
                    content.push(b' ');
                }
                content.extend_from_slice(&bytes);
            }
            None => warn!(page = index, "content stream could not be decompressed"),
        }
    }
    content
}

// --- page labels ---

#[derive(Debug, Clone, PartialEq)]
struct LabelRange {
    first_page: usize,
    style: Option<u8>,
    prefix: String,
    start: u32,
}

/// Labels from the catalog's `/PageLabels` number tree; 1-based page
/// numbers when there is none.
fn page_labels(doc: &Document, count: usize) -> Vec<String> {
    let ranges = doc
        .trailer
        .get(b"Root")
        .ok()
        .and_then(|o| resolve(doc, o).as_dict().ok())
        .and_then(|catalog| catalog.get(b"PageLabels").ok())
        .map(|tree| {
            let mut ranges = Vec::new();
            collect_label_ranges(doc, tree, &mut ranges, 0);
            ranges.sort_by_key(|r| r.first_page);
            ranges
        })
        .unwrap_or_default();

    (0..count)
        .map(|page| match ranges.iter().rev().find(|r| r.first_page <= page) {
            Some(range) => format_label(range, page),
            None => (page + 1).to_string(),
        })
        .collect()
}

fn collect_label_ranges(doc: &Document, node: &Object, out: &mut Vec<LabelRange>, depth: usize) {
    if depth > MAX_TREE_DEPTH {
        return;
    }
    let Ok(node) = resolve(doc, node).as_dict() else {
        return;
    };
    if let Some(nums) = node.get(b"Nums").ok().and_then(|o| resolve(doc, o).as_array().ok()) {
        for pair in nums.chunks_exact(2) {
            let (Some(first_page), Ok(label)) =
                (number(doc, &pair[0]), resolve(doc, &pair[1]).as_dict())
            else {
                continue;
            };
            out.push(LabelRange {
                first_page: first_page.max(0.0) as usize,
                style: label
                    .get(b"S")
                    .ok()
                    .and_then(name_of)
                    .and_then(|s| s.bytes().next()),
                prefix: label
                    .get(b"P")
                    .ok()
                    .and_then(|o| match resolve(doc, o) {
                        Object::String(bytes, _) => Some(decode_text_string(bytes)),
                        _ => None,
                    })
                    .unwrap_or_default(),
                start: label
                    .get(b"St")
                    .ok()
                    .and_then(|o| number(doc, o))
                    .unwrap_or(1.0)
                    .clamp(1.0, MAX_LABEL_START) as u32,
            });
        }
    }
    if let Some(kids) = node.get(b"Kids").ok().and_then(|o| resolve(doc, o).as_array().ok()) {
        for kid in kids {
            collect_label_ranges(doc, kid, out, depth + 1);
        }
    }
}

fn format_label(range: &LabelRange, page: usize) -> String {
    let offset = u32::try_from(page - range.first_page).unwrap_or(u32::MAX);
    let n = range.start.saturating_add(offset);
    let numeral = match range.style {
        Some(b'D') => n.to_string(),
        Some(b'R') => roman(n).unwrap_or_else(|| n.to_string()),
        Some(b'r') => roman(n).map_or_else(|| n.to_string(), |r| r.to_ascii_lowercase()),
        Some(b'A') => letters(n).unwrap_or_else(|| n.to_string()),
        Some(b'a') => letters(n).map_or_else(|| n.to_string(), |l| l.to_ascii_lowercase()),
        _ => String::new(),
    };
    format!("{}{}", range.prefix, numeral)
}

/// Roman numeral for 1..=3999.
fn roman(mut n: u32) -> Option<String> {
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    if !(1..=MAX_ROMAN_LABEL).contains(&n) {
        return None;
    }
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    Some(out)
}

/// A..Z, then AA..ZZ, AAA..ZZZ, up to [`MAX_LETTER_LABEL`].
fn letters(n: u32) -> Option<String> {
    if !(1..=MAX_LETTER_LABEL).contains(&n) {
        return None;
    }
    let letter = char::from(b'A' + ((n - 1) % 26) as u8);
    let repeat = ((n - 1) / 26 + 1) as usize;
    Some(std::iter::repeat_n(letter, repeat).collect())
}

/// PDF text string: UTF-16BE with a byte order mark, otherwise one char
/// per byte.
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

// --- object helpers ---

/// Follow a reference, or return the object itself.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn number(doc: &Document, obj: &Object) -> Option<f64> {
    match resolve(doc, obj) {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

fn numbers(doc: &Document, obj: &Object) -> Option<Vec<f64>> {
    resolve(doc, obj)
        .as_array()
        .ok()?
        .iter()
        .map(|o| number(doc, o))
        .collect()
}

fn name_of(obj: &Object) -> Option<String> {
    match obj {
        Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
        _ => None,
    }
}

fn rect_from(doc: &Document, obj: &Object) -> Option<Rectangle> {
    match numbers(doc, obj)?.as_slice() {
        [x1, y1, x2, y2] => Some(Rectangle::new(
            x1.min(*x2),
            y1.min(*y2),
            x1.max(*x2),
            y1.max(*y2),
        )),
        _ => None,
    }
}

fn sub_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    dict.get(key).ok().and_then(|o| resolve(doc, o).as_dict().ok())
}

/// First `/Filter` of a stream.
fn first_filter(doc: &Document, dict: &Dictionary) -> ImageFilter {
    match dict.get(b"Filter").ok().map(|o| resolve(doc, o)) {
        Some(Object::Name(n)) => ImageFilter::from_pdf_name(&String::from_utf8_lossy(n)),
        Some(Object::Array(filters)) => filters
            .first()
            .and_then(name_of)
            .map_or(ImageFilter::Raw, |n| ImageFilter::from_pdf_name(&n)),
        _ => ImageFilter::Raw,
    }
}

/// Stream bytes, decompressed when a filter is present.
fn decode_stream(stream: &lopdf::Stream) -> Option<Vec<u8>> {
    if stream.dict.get(b"Filter").is_ok() {
        stream.decompressed_content().ok()
    } else {
        Some(stream.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, StringFormat, dictionary};

    /// One-page document; `build` fills the page's resource dictionary.
    fn one_page_doc(content: &[u8], build: impl FnOnce(&mut Document, &mut Dictionary)) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));

        let mut resources = Dictionary::new();
        build(&mut doc, &mut resources);
        let resources_id = doc.add_object(resources);

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn multi_page_doc(count: usize, labels: Option<Object>) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..count)
            .map(|i| {
                let page = if i == 0 {
                    dictionary! { "Type" => "Page", "Parent" => pages_id, "Dur" => 2.5f32, "Rotate" => 90 }
                } else {
                    dictionary! { "Type" => "Page", "Parent" => pages_id }
                };
                doc.add_object(page).into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count as i64,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let mut catalog = dictionary! { "Type" => "Catalog", "Pages" => pages_id };
        if let Some(labels) = labels {
            catalog.set("PageLabels", labels);
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);
        doc
    }

    // --- pages ---

    #[test]
    fn loads_saved_document() {
        let mut doc = multi_page_doc(2, None);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let doc = load_document(&bytes).unwrap();
        let pages = page_models(&doc).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].index, 1);
        assert_eq!(pages[1].label, "2");
        assert_eq!(pages[0].size, (612.0, 792.0));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(load_document(b"not a pdf"), Err(BackendError::Parse(_))));
    }

    #[test]
    fn inherited_media_box_rotate_and_duration() {
        let doc = multi_page_doc(2, None);
        let page = page_model(&doc, 0).unwrap();
        assert_eq!(page.media_box, Rectangle::new(0.0, 0.0, 612.0, 792.0));
        assert_eq!(page.rotation, 90);
        assert_eq!(page.duration, Some(2.5));
        assert_eq!(page_model(&doc, 1).unwrap().duration, None);
    }

    #[test]
    fn page_index_out_of_range() {
        let doc = multi_page_doc(1, None);
        let err = page_model(&doc, 3).unwrap_err();
        assert!(matches!(
            PdfError::from(err),
            PdfError::PageIndexOutOfRange { index: 3, count: 1 }
        ));
    }

    #[test]
    fn contents_array_is_joined() {
        let mut doc = one_page_doc(b"q", |_, _| {});
        let second = doc.add_object(Stream::new(dictionary! {}, b"Q".to_vec()));
        let page_id = *doc.get_pages().values().next().unwrap();
        let first = doc
            .get_object(page_id)
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .clone();
        doc.get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Contents", vec![first, Object::Reference(second)]);
        assert_eq!(page_model(&doc, 0).unwrap().content, b"q Q".to_vec());
    }

    // --- labels ---

    #[test]
    fn page_labels_with_styles_and_prefix() {
        let labels = Object::Dictionary(dictionary! {
            "Nums" => vec![
                0.into(), Object::Dictionary(dictionary! { "S" => "r" }),
                2.into(), Object::Dictionary(dictionary! { "S" => "D", "St" => 5 }),
                4.into(), Object::Dictionary(dictionary! {
                    "S" => "A",
                    "P" => Object::String(b"App-".to_vec(), StringFormat::Literal),
                }),
            ],
        });
        let doc = multi_page_doc(6, Some(labels));
        let labels: Vec<String> = page_models(&doc).unwrap().into_iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["i", "ii", "5", "6", "App-A", "App-B"]);
    }

    #[test]
    fn page_index_is_shared_by_loaders() {
        let labels = Object::Dictionary(dictionary! {
            "Nums" => vec![0.into(), Object::Dictionary(dictionary! { "S" => "r" })],
        });
        let doc = multi_page_doc(3, Some(labels));
        let index = PageIndex::new(&doc);
        assert_eq!(index.len(), 3);
        assert_eq!(index.label(2), Some("iii"));
        assert_eq!(index.label(3), None);

        let mut loader = PageLoader::with_index(&doc, index.clone());
        assert_eq!(loader.page_count(), 3);
        assert_eq!(loader.load(2).unwrap().label, "iii");
        assert_eq!(loader.load(0).unwrap().label, "i");
    }

    #[test]
    fn label_numerals() {
        assert_eq!(roman(1994).as_deref(), Some("MCMXCIV"));
        assert_eq!(letters(1).as_deref(), Some("A"));
        assert_eq!(letters(28).as_deref(), Some("BB"));
        assert_eq!(decode_text_string(&[0xFE, 0xFF, 0x00, 0x41]), "A");
    }

    fn range(style: u8, start: u32) -> LabelRange {
        LabelRange {
            first_page: 0,
            style: Some(style),
            prefix: String::new(),
            start,
        }
    }

    #[test]
    fn huge_label_start_saturates() {
        assert_eq!(format_label(&range(b'D', u32::MAX), 1), u32::MAX.to_string());
        assert_eq!(format_label(&range(b'D', u32::MAX - 1), 5), u32::MAX.to_string());
    }

    #[test]
    fn out_of_range_numerals_fall_back_to_decimal() {
        assert_eq!(format_label(&range(b'A', 4_000_000_000), 0), "4000000000");
        assert_eq!(format_label(&range(b'a', 26 * 26 + 1), 0), "677");
        assert_eq!(format_label(&range(b'a', 26 * 26), 0), "z".repeat(26));
        assert_eq!(format_label(&range(b'R', 3999), 1), "4000");
        assert_eq!(format_label(&range(b'r', 3999), 0), "mmmcmxcix");
    }

    #[test]
    fn label_start_is_clamped_when_parsed() {
        let labels = Object::Dictionary(dictionary! {
            "Nums" => vec![
                0.into(),
                Object::Dictionary(dictionary! { "S" => "D", "St" => 1_i64 << 40 }),
            ],
        });
        let doc = multi_page_doc(2, Some(labels));
        let labels: Vec<String> = page_models(&doc).unwrap().into_iter().map(|p| p.label).collect();
        assert_eq!(labels, vec![u32::MAX.to_string(), u32::MAX.to_string()]);
    }

    // --- resources ---

    #[test]
    fn simple_font_widths_encoding_and_to_unicode() {
        let cmap = b"1 beginbfchar <41> <0058> endbfchar".to_vec();
        let doc = one_page_doc(b"BT ET", |doc, res| {
            let to_unicode = doc.add_object(Stream::new(dictionary! {}, cmap));
            let descriptor = doc.add_object(dictionary! {
                "Type" => "FontDescriptor",
                "Ascent" => 700,
                "Descent" => -200,
                "Flags" => 64,
                "MissingWidth" => 250,
            });
            let font = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "TrueType",
                "BaseFont" => "ABCDEF+Arial-Bold",
                "FirstChar" => 65,
                "Widths" => vec![722.into(), 667.into()],
                "FontDescriptor" => descriptor,
                "ToUnicode" => to_unicode,
                "Encoding" => Object::Dictionary(dictionary! {
                    "BaseEncoding" => "WinAnsiEncoding",
                    "Differences" => vec![66.into(), Object::Name(b"Euro".to_vec())],
                }),
            });
            res.set("Font", dictionary! { "F1" => font });
        });
        let page = page_model(&doc, 0).unwrap();
        let font = page.resources.font("F1").unwrap();

        assert_eq!(font.display_name(), "Arial-Bold");
        assert_eq!(font.advance(65), 722.0);
        assert_eq!(font.advance(66), 667.0);
        assert_eq!(font.advance(90), 250.0);
        assert_eq!(font.ascent, 700.0);
        assert_eq!(font.descent, -200.0);
        assert!(font.flags.italic);
        assert!(font.flags.bold);
        assert_eq!(font.to_unicode.get(&0x41).map(String::as_str), Some("X"));
        assert_eq!(font.encoding.as_ref().and_then(|e| e.decode(66)), Some('\u{20AC}'));
    }

    #[test]
    fn type0_font_is_two_byte_with_w_widths() {
        let doc = one_page_doc(b"BT ET", |doc, res| {
            let cid_font = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "CIDFontType2",
                "DW" => 500,
                "W" => vec![
                    1.into(), Object::Array(vec![100.into(), 200.into()]),
                    10.into(), 12.into(), 300.into(),
                ],
            });
            let font = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => "MSGothic",
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![Object::Reference(cid_font)],
            });
            res.set("Font", dictionary! { "F2" => font });
        });
        let page = page_model(&doc, 0).unwrap();
        let font = page.resources.font("F2").unwrap();
        assert_eq!(font.code_width, CodeWidth::TwoByte);
        assert_eq!(font.advance(2), 200.0);
        assert_eq!(font.advance(11), 300.0);
        assert_eq!(font.advance(99), 500.0);
    }

    #[test]
    fn font_without_widths_uses_default_width() {
        let doc = one_page_doc(b"BT ET", |doc, res| {
            let font = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Courier",
            });
            res.set("Font", dictionary! { "F1" => font });
        });
        let page = page_model(&doc, 0).unwrap();
        assert_eq!(page.resources.font("F1").unwrap().advance(65), DEFAULT_SIMPLE_WIDTH);
    }

    #[test]
    fn image_and_form_xobjects() {
        let doc = one_page_doc(b"/Fm0 Do", |doc, res| {
            let image = doc.add_object(Stream::new(
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
            let form = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
                    "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 60.into()],
                    "Resources" => dictionary! { "XObject" => dictionary! { "Im0" => image } },
                },
                b"/Im0 Do".to_vec(),
            ));
            res.set("XObject", dictionary! { "Fm0" => form });
        });
        let page = page_model(&doc, 0).unwrap();

        let Some(XObject::Form(form)) = page.resources.xobject("Fm0") else {
            panic!("Fm0 should be a form");
        };
        assert_eq!(form.content, b"/Im0 Do".to_vec());
        assert_eq!(form.matrix, Ctm::new(1.0, 0.0, 0.0, 1.0, 50.0, 60.0));
        assert_eq!(form.bbox, Some(Rectangle::new(0.0, 0.0, 100.0, 100.0)));

        let inner = form.resources.as_deref().unwrap();
        let Some(XObject::Image(image)) = inner.xobject("Im0") else {
            panic!("Im0 should be an image");
        };
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.color_space, ColorSpace::DeviceRgb);
        assert_eq!(image.filter, ImageFilter::Raw);
        assert!(page.resources.find_image(image.id).is_some());
    }

    #[test]
    fn form_sharing_page_resources_inherits_them() {
        let mut doc = Document::with_version("1.5");
        let resources_id = doc.new_object_id();
        let form = doc.add_object(Stream::new(
            dictionary! { "Subtype" => "Form", "Resources" => resources_id },
            b"/Fm0 Do".to_vec(),
        ));
        doc.objects.insert(
            resources_id,
            Object::Dictionary(dictionary! { "XObject" => dictionary! { "Fm0" => form } }),
        );
        let pages_id = doc.new_object_id();
        let content = doc.add_object(Stream::new(dictionary! {}, b"/Fm0 Do".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
            }),
        );
        let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog);

        let page = page_model(&doc, 0).unwrap();
        let Some(XObject::Form(form)) = page.resources.xobject("Fm0") else {
            panic!("Fm0 should be a form");
        };
        assert!(form.resources.is_none());
        // no MediaBox anywhere
        assert_eq!(page.size, (612.0, 792.0));
    }

    #[test]
    fn named_color_spaces() {
        let doc = one_page_doc(b"/CS0 cs", |doc, res| {
            let icc = doc.add_object(Stream::new(dictionary! { "N" => 1 }, vec![0; 4]));
            res.set(
                "ColorSpace",
                dictionary! {
                    "CS0" => vec![Object::Name(b"ICCBased".to_vec()), Object::Reference(icc)],
                    "CS1" => vec![Object::Name(b"Separation".to_vec()), Object::Name(b"Gold".to_vec())],
                },
            );
        });
        let page = page_model(&doc, 0).unwrap();
        assert_eq!(page.resources.color_space("CS0"), Some(&ColorSpace::DeviceGray));
        assert!(matches!(
            page.resources.color_space("CS1"),
            Some(ColorSpace::Unsupported(_))
        ));
    }

    #[test]
    fn differences_run_consecutively() {
        let doc = Document::with_version("1.5");
        let diffs = vec![
            Object::Integer(65),
            Object::Name(b"B".to_vec()),
            Object::Name(b"C".to_vec()),
            Object::Integer(200),
            Object::Name(b"eacute".to_vec()),
        ];
        assert_eq!(
            parse_differences(&doc, &diffs),
            vec![
                (65, "B".to_string()),
                (66, "C".to_string()),
                (200, "eacute".to_string())
            ]
        );
    }
}

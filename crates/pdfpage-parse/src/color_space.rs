//! Color space resolution.
//!
//! Maps `cs`/`CS` operand names to [`ColorSpace`] values, first against the
//! device families and then against a page's resource table, and converts
//! lopdf color space objects (`[/ICCBased ..]`, `[/Indexed ..]`, ...) when
//! the loader builds that table.

use pdfpage_core::{ColorSpace, ResourceTable};

/// Nesting limit for color spaces that name other color spaces.
const MAX_NESTING: usize = 4;

/// Color space for one of the device family names, or `/Pattern`.
pub fn device_color_space(name: &str) -> Option<ColorSpace> {
    match name {
        "DeviceGray" | "G" | "CalGray" => Some(ColorSpace::DeviceGray),
        "DeviceRGB" | "RGB" | "CalRGB" => Some(ColorSpace::DeviceRgb),
        "DeviceCMYK" | "CMYK" => Some(ColorSpace::DeviceCmyk),
        "Pattern" => Some(ColorSpace::Unsupported("Pattern".to_string())),
        _ => None,
    }
}

/// Resolve a `cs`/`CS` operand name.
///
/// Device names win over resource entries. `None` when neither knows the
/// name.
pub fn resolve_color_space_name(name: &str, resources: &ResourceTable) -> Option<ColorSpace> {
    device_color_space(name).or_else(|| resources.color_space(name).cloned())
}

/// Convert a color space object from a `/ColorSpace` resource dictionary
/// or an image's `/ColorSpace` entry.
pub fn resolve_color_space_object(
    obj: &lopdf::Object,
    doc: &lopdf::Document,
) -> Option<ColorSpace> {
    resolve_nested(obj, doc, 0)
}

fn resolve_nested(obj: &lopdf::Object, doc: &lopdf::Document, depth: usize) -> Option<ColorSpace> {
    if depth > MAX_NESTING {
        return None;
    }
    match obj {
        lopdf::Object::Name(n) => {
            let name = String::from_utf8_lossy(n);
            device_color_space(&name)
                .or_else(|| Some(ColorSpace::Unsupported(name.into_owned())))
        }
        lopdf::Object::Array(arr) => resolve_array(arr, doc, depth),
        lopdf::Object::Reference(id) => {
            let target = doc.get_object(*id).ok()?;
            resolve_nested(target, doc, depth + 1)
        }
        _ => None,
    }
}

/// `[/Family operands...]`
fn resolve_array(arr: &[lopdf::Object], doc: &lopdf::Document, depth: usize) -> Option<ColorSpace> {
    let family = match arr.first()? {
        lopdf::Object::Name(n) => String::from_utf8_lossy(n).into_owned(),
        _ => return None,
    };

    match family.as_str() {
        "ICCBased" => resolve_icc_based(arr, doc, depth),
        "Indexed" | "I" => resolve_indexed(arr, doc, depth),
        "Separation" | "DeviceN" | "Lab" => Some(ColorSpace::Unsupported(family)),
        _ => device_color_space(&family),
    }
}

/// `[/ICCBased stream]`: the device family with the profile's component count.
fn resolve_icc_based(
    arr: &[lopdf::Object],
    doc: &lopdf::Document,
    depth: usize,
) -> Option<ColorSpace> {
    let stream = match arr.get(1)? {
        lopdf::Object::Reference(id) => doc.get_object(*id).ok()?.as_stream().ok()?,
        lopdf::Object::Stream(s) => s,
        _ => return None,
    };

    let from_n = match stream.dict.get(b"N").and_then(|o| o.as_i64()) {
        Ok(1) => Some(ColorSpace::DeviceGray),
        Ok(4) => Some(ColorSpace::DeviceCmyk),
        Ok(3) => Some(ColorSpace::DeviceRgb),
        _ => None,
    };
    if from_n.is_some() {
        return from_n;
    }

    // No usable /N: fall back to /Alternate, then RGB.
    let alternate = stream
        .dict
        .get(b"Alternate")
        .ok()
        .and_then(|o| resolve_nested(o, doc, depth + 1));
    Some(alternate.unwrap_or(ColorSpace::DeviceRgb))
}

/// `[/Indexed base hival lookup]`
fn resolve_indexed(
    arr: &[lopdf::Object],
    doc: &lopdf::Document,
    depth: usize,
) -> Option<ColorSpace> {
    if arr.len() < 4 {
        return None;
    }

    let base = resolve_nested(&arr[1], doc, depth + 1).unwrap_or(ColorSpace::DeviceRgb);
    if matches!(base, ColorSpace::Indexed { .. }) {
        // an Indexed base may not itself be Indexed
        return None;
    }

    let hival = match &arr[2] {
        lopdf::Object::Integer(n) => (*n).clamp(0, 255) as u8,
        _ => return None,
    };

    let lookup = match &arr[3] {
        lopdf::Object::String(bytes, _) => bytes.clone(),
        lopdf::Object::Stream(s) => s.decompressed_content().unwrap_or_else(|_| s.content.clone()),
        lopdf::Object::Reference(id) => match doc.get_object(*id).ok()? {
            lopdf::Object::Stream(s) => {
                s.decompressed_content().unwrap_or_else(|_| s.content.clone())
            }
            lopdf::Object::String(bytes, _) => bytes.clone(),
            _ => return None,
        },
        _ => return None,
    };

    Some(ColorSpace::Indexed {
        base: Box::new(base),
        hival,
        lookup,
    })
}

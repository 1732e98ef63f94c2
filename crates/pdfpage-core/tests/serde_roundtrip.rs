//! Serde serialization/deserialization round-trip tests.
//!
//! These tests verify that the public result and model types can be
//! serialized to JSON and deserialized back, producing equal values.

#![cfg(feature = "serde")]

use std::sync::Arc;

use pdfpage_core::*;

/// Helper: serialize to JSON string, deserialize back, assert equality.
fn roundtrip<T>(value: &T)
where
    T: serde::Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let json = serde_json::to_string(value).expect("serialize failed");
    let restored: T = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(*value, restored, "round-trip mismatch for JSON: {json}");
}

// --- Geometry and color ---

#[test]
fn test_serde_geometry() {
    roundtrip(&Point::new(1.5, 2.25));
    roundtrip(&Ctm::new(2.0, 0.0, 0.0, 3.0, 10.0, 20.0));
    roundtrip(&Rectangle::new(0.0, 0.0, 612.0, 792.0));
}

#[test]
fn test_serde_color_spaces() {
    roundtrip(&Color::new(0.5, 0.25, 1.0));
    roundtrip(&ColorSpace::DeviceCmyk);
    roundtrip(&ColorSpace::Indexed {
        base: Box::new(ColorSpace::DeviceRgb),
        hival: 0,
        lookup: vec![1, 2, 3],
    });
    roundtrip(&ColorSpace::Unsupported("Pattern".to_string()));
}

// --- Text results ---

#[test]
fn test_serde_text_results() {
    let attrs = TextAttributes {
        font_name: "Helvetica".to_string(),
        font_size: 12.0,
        is_underlined: true,
        start_index: 0,
        end_index: 2,
        color: Color::new(0.0, 0.5, 0.0),
    };
    roundtrip(&attrs);
    roundtrip(&TextEl {
        text: 'H',
        attrs: attrs.clone(),
        rect: Rectangle::new(100.0, 697.0, 100.12, 706.0),
    });
    roundtrip(&AssembledText {
        text: "Hi".to_string(),
        attributes: vec![attrs],
        layout: vec![Rectangle::default(); 2],
    });
}

// --- Images ---

#[test]
fn test_serde_image_placement_drops_page_link() {
    let page = Arc::new(PageModel::new(0, 10.0, 10.0, Vec::new()));
    let placement = ImagePlacement::new(5, "Im0", Rectangle::new(1.0, 2.0, 3.0, 4.0)).on_page(&page);
    let json = serde_json::to_string(&placement).unwrap();
    let restored: ImagePlacement = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, placement);
    assert!(!restored.is_page_open());
}

// --- Warnings ---

#[test]
fn test_serde_warnings() {
    roundtrip(
        &ExtractWarning::with_code(ExtractWarningCode::UnknownOperator, "unknown XY")
            .at_operator(3)
            .on_page(0),
    );
    roundtrip(&ExtractWarning::new("free-form"));
    roundtrip(&UnicodeNorm::Nfkc);
}

// --- Page model ---

#[test]
fn test_serde_page_model() {
    let font = FontDescriptor::new("F1")
        .with_base_font("ABCDEF+Helvetica")
        .with_widths(72, vec![10.0, 6.0]);
    let page = PageModel::new(0, 612.0, 792.0, b"BT /F1 12 Tf (Hi) Tj ET".to_vec())
        .with_label("i")
        .with_duration(2.5)
        .with_resources(ResourceTable::new().with_font("F1", font));
    roundtrip(&page);
}

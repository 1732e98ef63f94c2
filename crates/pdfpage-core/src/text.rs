//! Attribute runs and the per-codepoint join of text, runs and layout.

use crate::geometry::Rectangle;
use crate::painting::Color;

/// Formatting shared by a contiguous run of characters.
///
/// `start_index` and `end_index` are codepoint offsets into the page text;
/// the range is half-open, so `end_index` of one run equals `start_index`
/// of the next.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextAttributes {
    /// Font name (base font with any subset prefix removed).
    pub font_name: String,
    /// Font size in text space units.
    pub font_size: f64,
    /// Whether the font is flagged as underline-capable.
    pub is_underlined: bool,
    /// First codepoint covered by this run.
    pub start_index: usize,
    /// One past the last codepoint covered by this run.
    pub end_index: usize,
    /// Paint color of the glyphs.
    pub color: Color,
}

impl TextAttributes {
    /// Number of codepoints covered by this run.
    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the run covers codepoint `index`.
    pub fn contains(&self, index: usize) -> bool {
        self.start_index <= index && index < self.end_index
    }
}

/// One codepoint together with its attribute run and layout rectangle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextEl {
    pub text: char,
    pub attrs: TextAttributes,
    pub rect: Rectangle,
}

/// Zip the page text, its attribute runs and its layout into [`TextEl`]s.
///
/// Runs are walked with a single cursor, so the merge is linear. The result
/// stops at the shortest of the text and the layout; a codepoint that no run
/// covers ends the merge as well.
pub fn merge_text_layout_and_attrs(
    text: &str,
    attrs: &[TextAttributes],
    layout: &[Rectangle],
) -> Vec<TextEl> {
    let mut out = Vec::with_capacity(layout.len());
    let mut run = 0;
    for (i, (ch, rect)) in text.chars().zip(layout).enumerate() {
        while run < attrs.len() && attrs[run].end_index <= i {
            run += 1;
        }
        match attrs.get(run) {
            Some(a) if a.contains(i) => out.push(TextEl {
                text: ch,
                attrs: a.clone(),
                rect: *rect,
            }),
            _ => break,
        }
    }
    out
}

/// Check that `attrs` are contiguous and cover `[0, len)` exactly.
pub fn runs_cover(attrs: &[TextAttributes], len: usize) -> bool {
    let mut expected = 0;
    for a in attrs {
        if a.start_index != expected || a.end_index <= a.start_index {
            return false;
        }
        expected = a.end_index;
    }
    expected == len
}

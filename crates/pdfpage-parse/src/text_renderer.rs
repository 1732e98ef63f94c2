//! Text rendering operators (Tj, TJ, ', ") for the content stream interpreter.
//!
//! Decodes shown strings into glyphs, computes each glyph's page-space box
//! and advances the text matrix in the [`TextState`].

use pdfpage_core::{Ctm, FontDescriptor, Rectangle};

use crate::font::{AdvanceLookup, DecodedGlyph, decode_glyphs};
use crate::operand::Operand;
use crate::text_state::TextState;

/// A glyph placed by a text-showing operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ShownGlyph {
    pub glyph: DecodedGlyph,
    /// Axis-aligned glyph box in page space.
    pub rect: Rectangle,
    /// Text rendering matrix combined with the CTM.
    pub rendering_matrix: Ctm,
    /// Displacement in text space used to advance the text position.
    ///
    /// Calculated as: `((w0 / 1000) * font_size + char_spacing + word_spacing_if_space) * h_scaling`.
    pub advance: f64,
}

/// An element of a TJ array operand.
///
/// TJ arrays contain a mix of strings (to show) and numeric adjustments
/// (for kerning/spacing).
#[derive(Debug, Clone, PartialEq)]
pub enum TjElement {
    /// A string of bytes to show.
    String(Vec<u8>),
    /// A numeric adjustment in thousandths of a unit of text space.
    /// Positive values move left (tighten), negative move right (loosen).
    Adjustment(f64),
}

impl TjElement {
    /// Convert a TJ array operand. Elements that are neither strings nor
    /// numbers are dropped.
    pub fn from_operands(items: &[Operand]) -> Vec<TjElement> {
        items
            .iter()
            .filter_map(|item| match item {
                Operand::LiteralString(b) | Operand::HexString(b) => {
                    Some(TjElement::String(b.clone()))
                }
                other => other.as_f64().map(TjElement::Adjustment),
            })
            .collect()
    }
}

/// Page-space box of a glyph with advance `w0` (glyph space):
/// `[0, w0/1000] × [descent/1000, ascent/1000]` through `trm`.
pub fn glyph_rect(trm: &Ctm, w0: f64, font: &FontDescriptor) -> Rectangle {
    trm.transform_rect(0.0, font.descent / 1000.0, w0 / 1000.0, font.ascent / 1000.0)
}

/// `Tj` operator: show a string.
///
/// For each glyph:
/// 1. Compute the rendering matrix from the current text matrix and `ctm`
/// 2. Look up the glyph advance and compute its page-space box
/// 3. Advance the text position
pub fn show_string(
    text_state: &mut TextState,
    ctm: &Ctm,
    font: &FontDescriptor,
    bytes: &[u8],
    advances: &dyn AdvanceLookup,
) -> Vec<ShownGlyph> {
    let glyphs = decode_glyphs(font, bytes);
    let mut shown = Vec::with_capacity(glyphs.len());

    for glyph in glyphs {
        let rendering_matrix = text_state.rendering_matrix().concat(ctm);

        let w0 = advances.advance(font, glyph.code);
        let rect = glyph_rect(&rendering_matrix, w0, font);

        let word_spacing = if glyph.is_word_space() {
            text_state.word_spacing
        } else {
            0.0
        };
        let tx = ((w0 / 1000.0) * text_state.font_size + text_state.char_spacing + word_spacing)
            * text_state.h_scaling_normalized();

        text_state.advance_text_position(tx);
        shown.push(ShownGlyph {
            glyph,
            rect,
            rendering_matrix,
            advance: tx,
        });
    }

    shown
}

/// Apply a TJ numeric adjustment: `tx = -(adj / 1000) * font_size * h_scaling`.
pub fn adjust_position(text_state: &mut TextState, adj: f64) {
    let tx = -(adj / 1000.0) * text_state.font_size * text_state.h_scaling_normalized();
    text_state.advance_text_position(tx);
}

/// `TJ` operator: show strings with positioning adjustments.
pub fn show_string_with_positioning(
    text_state: &mut TextState,
    ctm: &Ctm,
    font: &FontDescriptor,
    elements: &[TjElement],
    advances: &dyn AdvanceLookup,
) -> Vec<ShownGlyph> {
    let mut shown = Vec::new();

    for element in elements {
        match element {
            TjElement::String(bytes) => {
                shown.extend(show_string(text_state, ctm, font, bytes, advances));
            }
            TjElement::Adjustment(adj) => adjust_position(text_state, *adj),
        }
    }

    shown
}

/// `'` (single quote) operator: move to next line and show a string.
///
/// Equivalent to `T*` followed by `Tj`.
pub fn quote_show_string(
    text_state: &mut TextState,
    ctm: &Ctm,
    font: &FontDescriptor,
    bytes: &[u8],
    advances: &dyn AdvanceLookup,
) -> Vec<ShownGlyph> {
    text_state.move_to_next_line();
    show_string(text_state, ctm, font, bytes, advances)
}

/// `"` (double quote) operator: set word and character spacing, then `'`.
pub fn double_quote_show_string(
    text_state: &mut TextState,
    ctm: &Ctm,
    font: &FontDescriptor,
    word_spacing: f64,
    char_spacing: f64,
    bytes: &[u8],
    advances: &dyn AdvanceLookup,
) -> Vec<ShownGlyph> {
    text_state.word_spacing = word_spacing;
    text_state.char_spacing = char_spacing;
    quote_show_string(text_state, ctm, font, bytes, advances)
}

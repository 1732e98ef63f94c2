//! Glyph decoding: shown-string bytes to character codes, codes to Unicode,
//! and the advance-width seam.

use pdfpage_core::{CodeWidth, FontDescriptor};

/// One glyph decoded from a shown string.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGlyph {
    /// Character code (one or two bytes, big-endian).
    pub code: u32,
    /// Unicode text of the glyph; may hold several codepoints (ligatures).
    pub text: String,
    /// Whether the code came from a single byte. Word spacing applies only
    /// to the single-byte code 32.
    pub single_byte: bool,
    /// The font maps codes to Unicode but not this one; `text` is the
    /// Latin-1 reading of the code.
    pub unmapped: bool,
}

impl DecodedGlyph {
    /// Whether `Tw` applies to this glyph.
    pub fn is_word_space(&self) -> bool {
        self.single_byte && self.code == 32
    }
}

/// Split `bytes` into glyphs according to the font's code width.
///
/// Two-byte fonts read big-endian pairs; a trailing odd byte is read as a
/// single-byte code.
pub fn decode_glyphs(font: &FontDescriptor, bytes: &[u8]) -> Vec<DecodedGlyph> {
    let mut glyphs = Vec::with_capacity(bytes.len());
    match font.code_width {
        CodeWidth::OneByte => {
            for &b in bytes {
                glyphs.push(decode_code(font, u32::from(b), true));
            }
        }
        CodeWidth::TwoByte => {
            for pair in bytes.chunks(2) {
                let glyph = match pair {
                    [hi, lo] => decode_code(font, u32::from(*hi) << 8 | u32::from(*lo), false),
                    [b] => decode_code(font, u32::from(*b), true),
                    _ => continue,
                };
                glyphs.push(glyph);
            }
        }
    }
    glyphs
}

/// Map one code to Unicode: `/ToUnicode`, then the font encoding, then
/// Latin-1.
pub fn decode_code(font: &FontDescriptor, code: u32, single_byte: bool) -> DecodedGlyph {
    if let Some(text) = font.to_unicode.get(&code) {
        return DecodedGlyph {
            code,
            text: text.clone(),
            single_byte,
            unmapped: false,
        };
    }

    if single_byte {
        if let Some(ch) = font.encoding.as_ref().and_then(|e| e.decode(code as u8)) {
            return DecodedGlyph {
                code,
                text: ch.to_string(),
                single_byte,
                unmapped: false,
            };
        }
    }

    let has_mapping = !font.to_unicode.is_empty() || font.encoding.is_some();
    DecodedGlyph {
        code,
        text: latin1_fallback(code).to_string(),
        single_byte,
        unmapped: has_mapping,
    }
}

fn latin1_fallback(code: u32) -> char {
    match code {
        0..=0xFF => char::from(code as u8),
        _ => char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
    }
}

/// Source of glyph advance widths, in glyph space (1/1000 of the font size).
///
/// The interpreter treats the font program as a black box and asks this
/// seam for advances only.
pub trait AdvanceLookup: Send + Sync {
    fn advance(&self, font: &FontDescriptor, code: u32) -> f64;
}

/// Reads advances from the descriptor's `/Widths` (or `/W`) table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontTableAdvances;

impl AdvanceLookup for FontTableAdvances {
    fn advance(&self, font: &FontDescriptor, code: u32) -> f64 {
        font.advance(code)
    }
}

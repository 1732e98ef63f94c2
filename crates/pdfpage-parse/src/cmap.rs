//! ToUnicode CMap parser.
//!
//! CMap programs are PostScript, so they go through the content stream
//! lexer and operand assembler. Only `beginbfchar`/`endbfchar` and
//! `beginbfrange`/`endbfrange` sections matter; everything else (code
//! space ranges, `CIDSystemInfo`, `defineresource`) is read and dropped.

use std::collections::HashMap;

use tracing::debug;

use crate::lexer::{ContentStreamLexer, Token};
use crate::operand::{Operand, OperandStack};

/// Largest `bfrange` expanded; wider ranges are truncated.
const MAX_RANGE: u32 = 0xFFFF;

/// Parse a `/ToUnicode` stream into a code to Unicode table.
///
/// Malformed entries are skipped.
pub fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    let mut mappings = HashMap::new();
    let mut operands = OperandStack::new();

    let mut lexer = ContentStreamLexer::new(data);
    loop {
        let offset = lexer.offset();
        let Some(item) = lexer.next() else {
            break;
        };
        let token = match item {
            Ok(token) => token,
            // `{ }` procedures and other PostScript-only syntax
            Err(_) => continue,
        };
        match token {
            Token::Operator(keyword) => {
                let (args, _) = operands.take();
                match keyword.as_str() {
                    "endbfchar" => bf_chars(&args, &mut mappings),
                    "endbfrange" => bf_ranges(&args, &mut mappings),
                    _ => {}
                }
            }
            token => {
                if operands.push(token, offset).is_err() {
                    operands.clear();
                }
            }
        }
    }
    mappings
}

/// `<src> <dst>` pairs.
fn bf_chars(args: &[Operand], mappings: &mut HashMap<u32, String>) {
    for pair in args.chunks_exact(2) {
        let (Some(src), Some(dst)) = (pair[0].as_bytes(), pair[1].as_bytes()) else {
            continue;
        };
        if let Some(text) = decode_utf16be(dst) {
            mappings.insert(code_of(src), text);
        }
    }
}

/// `<lo> <hi> <dst>` or `<lo> <hi> [<dst> ...]` triples.
fn bf_ranges(args: &[Operand], mappings: &mut HashMap<u32, String>) {
    for triple in args.chunks_exact(3) {
        let (Some(lo), Some(hi)) = (triple[0].as_bytes(), triple[1].as_bytes()) else {
            continue;
        };
        let lo = code_of(lo);
        let hi = code_of(hi);
        if hi < lo {
            continue;
        }
        let hi = if hi - lo > MAX_RANGE {
            debug!(lo, hi, "bfrange truncated");
            lo + MAX_RANGE
        } else {
            hi
        };

        match &triple[2] {
            Operand::Array(items) => {
                for (code, item) in (lo..=hi).zip(items) {
                    if let Some(text) = item.as_bytes().and_then(decode_utf16be) {
                        mappings.insert(code, text);
                    }
                }
            }
            dst => {
                let Some(units) = dst.as_bytes().map(utf16_units) else {
                    continue;
                };
                for (offset, code) in (lo..=hi).enumerate() {
                    if let Some(text) = increment_last(&units, offset as u32) {
                        mappings.insert(code, text);
                    }
                }
            }
        }
    }
}

/// Big-endian character code.
fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// UTF-16BE code units; a lone byte is one unit.
fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    if bytes.len() == 1 {
        return vec![u16::from(bytes[0])];
    }
    bytes
        .chunks(2)
        .map(|c| match c {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [b] => u16::from(*b),
            _ => 0,
        })
        .collect()
}

fn decode_utf16be(bytes: &[u8]) -> Option<String> {
    String::from_utf16(&utf16_units(bytes)).ok()
}

/// Destination of the `offset`-th code in a range: the last code unit
/// (or the scalar value of a trailing surrogate pair) advanced by `offset`.
fn increment_last(units: &[u16], offset: u32) -> Option<String> {
    let mut text = String::from_utf16(units).ok()?;
    let last = text.pop()?;
    text.push(char::from_u32(u32::from(last) + offset)?);
    Some(text)
}

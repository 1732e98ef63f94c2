//! Simple-font text encodings.
//!
//! Implements the WinAnsi, MacRoman and Standard base encodings, `/Differences`
//! overrides and the glyph-name lookup they rely on. Code-to-Unicode
//! resolution for a whole font (ToUnicode first, then this encoding, then a
//! Latin-1 fallback) lives with the font decoder in the interpreter crate.

/// A named standard PDF encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StandardEncoding {
    /// WinAnsiEncoding (Windows code page 1252).
    WinAnsi,
    /// MacRomanEncoding.
    MacRoman,
    /// Adobe StandardEncoding, the implicit encoding of Type 1 fonts.
    Standard,
}

impl StandardEncoding {
    /// Parse an `/Encoding` or `/BaseEncoding` name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "WinAnsiEncoding" => Some(Self::WinAnsi),
            "MacRomanEncoding" => Some(Self::MacRoman),
            "StandardEncoding" => Some(Self::Standard),
            _ => None,
        }
    }

    /// Unicode character for a byte code, `None` for undefined codes.
    pub fn decode(&self, code: u8) -> Option<char> {
        match self {
            StandardEncoding::WinAnsi => decode_win_ansi(code),
            StandardEncoding::MacRoman => decode_mac_roman(code),
            StandardEncoding::Standard => decode_standard(code),
        }
    }
}

fn is_printable_ascii(code: u8) -> bool {
    (0x20..0x7F).contains(&code)
}

fn decode_win_ansi(code: u8) -> Option<char> {
    match code {
        c if is_printable_ascii(c) => Some(char::from(c)),
        0x80..=0x9F => WIN_ANSI_80_9F[usize::from(code - 0x80)],
        // 0xA0..=0xFF coincides with Latin-1
        0xA0..=0xFF => Some(char::from(code)),
        b'\t' | b'\n' | b'\r' => Some(char::from(code)),
        _ => None,
    }
}

fn decode_mac_roman(code: u8) -> Option<char> {
    match code {
        c if is_printable_ascii(c) => Some(char::from(c)),
        0x80..=0xFF => Some(MAC_ROMAN_HIGH[usize::from(code - 0x80)]),
        _ => None,
    }
}

fn decode_standard(code: u8) -> Option<char> {
    let ch = match code {
        0x27 => '\u{2019}', // quoteright
        0x60 => '\u{2018}', // quoteleft
        c if is_printable_ascii(c) => char::from(c),
        0xA1 => '\u{00A1}',
        0xA2 => '\u{00A2}',
        0xA3 => '\u{00A3}',
        0xA4 => '\u{2044}',
        0xA5 => '\u{00A5}',
        0xA6 => '\u{0192}',
        0xA7 => '\u{00A7}',
        0xA8 => '\u{00A4}',
        0xA9 => '\'',
        0xAA => '\u{201C}',
        0xAB => '\u{00AB}',
        0xAC => '\u{2039}',
        0xAD => '\u{203A}',
        0xAE => '\u{FB01}',
        0xAF => '\u{FB02}',
        0xB1 => '\u{2013}',
        0xB2 => '\u{2020}',
        0xB3 => '\u{2021}',
        0xB4 => '\u{00B7}',
        0xB6 => '\u{00B6}',
        0xB7 => '\u{2022}',
        0xB8 => '\u{201A}',
        0xB9 => '\u{201E}',
        0xBA => '\u{201D}',
        0xBB => '\u{00BB}',
        0xBC => '\u{2026}',
        0xBD => '\u{2030}',
        0xBF => '\u{00BF}',
        0xC1 => '`',
        0xC2 => '\u{00B4}',
        0xC3 => '\u{02C6}',
        0xC4 => '\u{02DC}',
        0xC5 => '\u{00AF}',
        0xC6 => '\u{02D8}',
        0xC7 => '\u{02D9}',
        0xC8 => '\u{00A8}',
        0xCA => '\u{02DA}',
        0xCB => '\u{00B8}',
        0xCD => '\u{02DD}',
        0xCE => '\u{02DB}',
        0xCF => '\u{02C7}',
        0xD0 => '\u{2014}',
        0xE1 => '\u{00C6}',
        0xE3 => '\u{00AA}',
        0xE8 => '\u{0141}',
        0xE9 => '\u{00D8}',
        0xEA => '\u{0152}',
        0xEB => '\u{00BA}',
        0xF1 => '\u{00E6}',
        0xF5 => '\u{0131}',
        0xF8 => '\u{0142}',
        0xF9 => '\u{00F8}',
        0xFA => '\u{0153}',
        0xFB => '\u{00DF}',
        _ => return None,
    };
    Some(ch)
}

/// WinAnsi codes 0x80..=0x9F, which differ from Latin-1.
const WIN_ANSI_80_9F: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// MacRoman codes 0x80..=0xFF.
const MAC_ROMAN_HIGH: [char; 128] = [
    '\u{00C4}', '\u{00C5}', '\u{00C7}', '\u{00C9}', '\u{00D1}', '\u{00D6}', '\u{00DC}', '\u{00E1}',
    '\u{00E0}', '\u{00E2}', '\u{00E4}', '\u{00E3}', '\u{00E5}', '\u{00E7}', '\u{00E9}', '\u{00E8}',
    '\u{00EA}', '\u{00EB}', '\u{00ED}', '\u{00EC}', '\u{00EE}', '\u{00EF}', '\u{00F1}', '\u{00F3}',
    '\u{00F2}', '\u{00F4}', '\u{00F6}', '\u{00F5}', '\u{00FA}', '\u{00F9}', '\u{00FB}', '\u{00FC}',
    '\u{2020}', '\u{00B0}', '\u{00A2}', '\u{00A3}', '\u{00A7}', '\u{2022}', '\u{00B6}', '\u{00DF}',
    '\u{00AE}', '\u{00A9}', '\u{2122}', '\u{00B4}', '\u{00A8}', '\u{2260}', '\u{00C6}', '\u{00D8}',
    '\u{221E}', '\u{00B1}', '\u{2264}', '\u{2265}', '\u{00A5}', '\u{00B5}', '\u{2202}', '\u{2211}',
    '\u{220F}', '\u{03C0}', '\u{222B}', '\u{00AA}', '\u{00BA}', '\u{03A9}', '\u{00E6}', '\u{00F8}',
    '\u{00BF}', '\u{00A1}', '\u{00AC}', '\u{221A}', '\u{0192}', '\u{2248}', '\u{2206}', '\u{00AB}',
    '\u{00BB}', '\u{2026}', '\u{00A0}', '\u{00C0}', '\u{00C3}', '\u{00D5}', '\u{0152}', '\u{0153}',
    '\u{2013}', '\u{2014}', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '\u{00F7}', '\u{25CA}',
    '\u{00FF}', '\u{0178}', '\u{2044}', '\u{20AC}', '\u{2039}', '\u{203A}', '\u{FB01}', '\u{FB02}',
    '\u{2021}', '\u{00B7}', '\u{201A}', '\u{201E}', '\u{2030}', '\u{00C2}', '\u{00CA}', '\u{00C1}',
    '\u{00CB}', '\u{00C8}', '\u{00CD}', '\u{00CE}', '\u{00CF}', '\u{00CC}', '\u{00D3}', '\u{00D4}',
    '\u{F8FF}', '\u{00D2}', '\u{00DA}', '\u{00DB}', '\u{00D9}', '\u{0131}', '\u{02C6}', '\u{02DC}',
    '\u{00AF}', '\u{02D8}', '\u{02D9}', '\u{02DA}', '\u{00B8}', '\u{02DD}', '\u{02DB}', '\u{02C7}',
];

/// A font's `/Encoding`: a base encoding with `/Differences` applied.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontEncoding {
    table: Vec<Option<char>>,
}

impl FontEncoding {
    pub fn from_standard(encoding: StandardEncoding) -> Self {
        Self {
            table: (0..=255u8).map(|code| encoding.decode(code)).collect(),
        }
    }

    /// Override codes with `(code, glyph name)` pairs from a `/Differences`
    /// array. Names with no known Unicode value leave the code undefined.
    pub fn apply_differences(&mut self, differences: &[(u8, String)]) {
        for (code, name) in differences {
            self.table[usize::from(*code)] = glyph_name_to_char(name);
        }
    }

    pub fn decode(&self, code: u8) -> Option<char> {
        self.table.get(usize::from(code)).copied().flatten()
    }
}

/// Resolve a glyph name to Unicode.
///
/// Handles `uniXXXX`, `uXXXX[XX]`, single-character names and the common
/// Adobe Glyph List names for Latin text.
pub fn glyph_name_to_char(name: &str) -> Option<char> {
    // "a.sc", "f_i.alt": only the part before the first period names the glyph
    let name = name.split('.').next().unwrap_or(name);

    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }

    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c);
        }
    }

    let ch = match name {
        "space" | "nbspace" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "minus" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "asciicircum" => '^',
        "underscore" => '_',
        "grave" => '`',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "asciitilde" => '~',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "quotesinglbase" => '\u{201A}',
        "quotedblbase" => '\u{201E}',
        "guillemotleft" => '\u{00AB}',
        "guillemotright" => '\u{00BB}',
        "guilsinglleft" => '\u{2039}',
        "guilsinglright" => '\u{203A}',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "bullet" => '\u{2022}',
        "ellipsis" => '\u{2026}',
        "dagger" => '\u{2020}',
        "daggerdbl" => '\u{2021}',
        "perthousand" => '\u{2030}',
        "trademark" => '\u{2122}',
        "copyright" => '\u{00A9}',
        "registered" => '\u{00AE}',
        "degree" => '\u{00B0}',
        "section" => '\u{00A7}',
        "paragraph" => '\u{00B6}',
        "periodcentered" => '\u{00B7}',
        "Euro" => '\u{20AC}',
        "sterling" => '\u{00A3}',
        "yen" => '\u{00A5}',
        "cent" => '\u{00A2}',
        "florin" => '\u{0192}',
        "fraction" => '\u{2044}',
        "multiply" => '\u{00D7}',
        "divide" => '\u{00F7}',
        "plusminus" => '\u{00B1}',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        "ff" => '\u{FB00}',
        "ffi" => '\u{FB03}',
        "ffl" => '\u{FB04}',
        "germandbls" => '\u{00DF}',
        "dotlessi" => '\u{0131}',
        "AE" => '\u{00C6}',
        "ae" => '\u{00E6}',
        "OE" => '\u{0152}',
        "oe" => '\u{0153}',
        "Oslash" => '\u{00D8}',
        "oslash" => '\u{00F8}',
        "Lslash" => '\u{0141}',
        "lslash" => '\u{0142}',
        "Aacute" => '\u{00C1}',
        "aacute" => '\u{00E1}',
        "Agrave" => '\u{00C0}',
        "agrave" => '\u{00E0}',
        "Adieresis" => '\u{00C4}',
        "adieresis" => '\u{00E4}',
        "Ccedilla" => '\u{00C7}',
        "ccedilla" => '\u{00E7}',
        "Eacute" => '\u{00C9}',
        "eacute" => '\u{00E9}',
        "Egrave" => '\u{00C8}',
        "egrave" => '\u{00E8}',
        "Ecircumflex" => '\u{00CA}',
        "ecircumflex" => '\u{00EA}',
        "Iacute" => '\u{00CD}',
        "iacute" => '\u{00ED}',
        "Ntilde" => '\u{00D1}',
        "ntilde" => '\u{00F1}',
        "Oacute" => '\u{00D3}',
        "oacute" => '\u{00F3}',
        "Odieresis" => '\u{00D6}',
        "odieresis" => '\u{00F6}',
        "Uacute" => '\u{00DA}',
        "uacute" => '\u{00FA}',
        "Udieresis" => '\u{00DC}',
        "udieresis" => '\u{00FC}',
        _ => return None,
    };
    Some(ch)
}

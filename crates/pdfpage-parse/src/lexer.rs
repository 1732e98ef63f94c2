//! Content stream lexer.
//!
//! [`ContentStreamLexer`] turns raw content stream bytes into a lazy
//! sequence of [`Token`]s. It never holds more than the token being read.
//! Syntax errors are reported as [`BackendError::MalformedStream`] items;
//! the lexer has already skipped past the bad input when it reports them,
//! so iteration can simply continue.

use crate::error::BackendError;
use crate::operand::{Operand, OperandStack};

/// A lexical token of a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer number (e.g., `42`, `-7`).
    Integer(i64),
    /// Real number (e.g., `3.14`, `.5`).
    Real(f64),
    /// Literal `(...)` or hex `<...>` string, stored as decoded bytes.
    String { bytes: Vec<u8>, hex: bool },
    /// Name object, stored without the leading `/`.
    Name(String),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
    Boolean(bool),
    Null,
    /// Bare keyword: an operator.
    Operator(String),
    /// A complete `BI ... ID ... EI` sequence.
    InlineImage(InlineImage),
}

impl Token {
    /// The operand this token stands for, if it is a simple value.
    pub fn into_operand(self) -> Option<Operand> {
        match self {
            Token::Integer(v) => Some(Operand::Integer(v)),
            Token::Real(v) => Some(Operand::Real(v)),
            Token::String { bytes, hex: false } => Some(Operand::LiteralString(bytes)),
            Token::String { bytes, hex: true } => Some(Operand::HexString(bytes)),
            Token::Name(name) => Some(Operand::Name(name)),
            Token::Boolean(b) => Some(Operand::Boolean(b)),
            Token::Null => Some(Operand::Null),
            _ => None,
        }
    }
}

/// Inline image data captured from a `BI ... ID ... EI` sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    /// Dictionary entries between `BI` and `ID`.
    pub dict: Vec<(String, Operand)>,
    /// Raw image data bytes between `ID` and `EI`.
    pub data: Vec<u8>,
}

impl InlineImage {
    /// Look up a dictionary entry by its full or abbreviated key.
    pub fn get(&self, key: &str, abbrev: &str) -> Option<&Operand> {
        self.dict
            .iter()
            .find(|(k, _)| k == key || k == abbrev)
            .map(|(_, v)| v)
    }
}

/// Lazy, restartable tokenizer over one content stream.
#[derive(Debug, Clone)]
pub struct ContentStreamLexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> ContentStreamLexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Rewind to the start of the stream.
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Byte offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn malformed(offset: usize, reason: impl Into<String>) -> BackendError {
        BackendError::MalformedStream {
            offset,
            reason: reason.into(),
        }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(b) = self.peek_at(0) {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while self.peek_at(0).is_some_and(|b| b != b'\n' && b != b'\r') {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    /// Skip to the next whitespace or delimiter byte.
    fn resync(&mut self) {
        while self
            .peek_at(0)
            .is_some_and(|b| !is_whitespace(b) && !is_delimiter(b))
        {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Option<Result<Token, BackendError>> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        let b = self.peek_at(0)?;

        let token = match b {
            b'(' => self.read_literal_string(),
            b'<' if self.peek_at(1) == Some(b'<') => {
                self.pos += 2;
                Ok(Token::DictStart)
            }
            b'<' => self.read_hex_string(),
            b'>' if self.peek_at(1) == Some(b'>') => {
                self.pos += 2;
                Ok(Token::DictEnd)
            }
            b'[' => {
                self.pos += 1;
                Ok(Token::ArrayStart)
            }
            b']' => {
                self.pos += 1;
                Ok(Token::ArrayEnd)
            }
            b'/' => Ok(Token::Name(self.read_name())),
            b'0'..=b'9' | b'+' | b'-' | b'.' => self.read_number(),
            b')' | b'>' | b'{' | b'}' => {
                self.pos += 1;
                Err(Self::malformed(
                    start,
                    format!("unexpected delimiter '{}'", b as char),
                ))
            }
            _ => {
                let keyword = self.read_keyword();
                match keyword.as_str() {
                    "true" => Ok(Token::Boolean(true)),
                    "false" => Ok(Token::Boolean(false)),
                    "null" => Ok(Token::Null),
                    "BI" => self.read_inline_image(start),
                    _ => Ok(Token::Operator(keyword)),
                }
            }
        };
        Some(token)
    }

    /// Literal string `(...)` with balanced parentheses and escape sequences.
    fn read_literal_string(&mut self) -> Result<Token, BackendError> {
        let start = self.pos;
        self.pos += 1;

        let mut result = Vec::new();
        let mut depth = 1u32;

        while let Some(b) = self.peek_at(0) {
            self.pos += 1;
            match b {
                b'(' => {
                    depth += 1;
                    result.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Token::String {
                            bytes: result,
                            hex: false,
                        });
                    }
                    result.push(b);
                }
                b'\\' => {
                    let Some(escaped) = self.peek_at(0) else {
                        break;
                    };
                    self.pos += 1;
                    match escaped {
                        b'n' => result.push(b'\n'),
                        b'r' => result.push(b'\r'),
                        b't' => result.push(b'\t'),
                        b'b' => result.push(0x08),
                        b'f' => result.push(0x0C),
                        b'\r' => {
                            // line continuation, CR or CR LF
                            if self.peek_at(0) == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut val = u32::from(escaped - b'0');
                            for _ in 0..2 {
                                match self.peek_at(0) {
                                    Some(d @ b'0'..=b'7') => {
                                        self.pos += 1;
                                        val = val * 8 + u32::from(d - b'0');
                                    }
                                    _ => break,
                                }
                            }
                            result.push((val & 0xFF) as u8);
                        }
                        // \( \) \\ and unknown escapes keep the character
                        other => result.push(other),
                    }
                }
                _ => result.push(b),
            }
        }

        Err(Self::malformed(start, "unterminated literal string"))
    }

    /// Hex string `<...>`. Whitespace is ignored; an odd digit count gets a
    /// trailing zero.
    fn read_hex_string(&mut self) -> Result<Token, BackendError> {
        let start = self.pos;
        self.pos += 1;

        let mut digits = Vec::new();
        let mut invalid = None;
        loop {
            let Some(b) = self.peek_at(0) else {
                return Err(Self::malformed(start, "unterminated hex string"));
            };
            self.pos += 1;
            if b == b'>' {
                break;
            }
            if is_whitespace(b) {
                continue;
            }
            match hex_digit(b) {
                Some(d) => digits.push(d),
                None => {
                    invalid.get_or_insert(b);
                }
            }
        }
        if let Some(b) = invalid {
            return Err(Self::malformed(
                start,
                format!("invalid hex digit {:?}", b as char),
            ));
        }

        if digits.len() % 2 != 0 {
            digits.push(0);
        }
        let bytes = digits.chunks(2).map(|c| (c[0] << 4) | c[1]).collect();
        Ok(Token::String { bytes, hex: true })
    }

    /// `/Name` with `#XX` escapes decoded.
    fn read_name(&mut self) -> String {
        self.pos += 1;
        let start = self.pos;
        self.resync();

        let raw = &self.input[start..self.pos];
        let mut name = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'#' && i + 2 < raw.len() {
                if let (Some(hi), Some(lo)) = (hex_digit(raw[i + 1]), hex_digit(raw[i + 2])) {
                    name.push((hi << 4) | lo);
                    i += 3;
                    continue;
                }
            }
            name.push(raw[i]);
            i += 1;
        }
        String::from_utf8_lossy(&name).into_owned()
    }

    fn read_number(&mut self) -> Result<Token, BackendError> {
        let start = self.pos;
        let mut has_dot = false;

        if matches!(self.peek_at(0), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        while let Some(b) = self.peek_at(0) {
            if b == b'.' && !has_dot {
                has_dot = true;
            } else if !b.is_ascii_digit() {
                break;
            }
            self.pos += 1;
        }

        let text = String::from_utf8_lossy(&self.input[start..self.pos]);
        let parsed = if has_dot {
            text.parse::<f64>().ok().map(Token::Real)
        } else {
            text.parse::<i64>()
                .ok()
                .map(Token::Integer)
                // integers too large for i64 are still valid reals
                .or_else(|| text.parse::<f64>().ok().map(Token::Real))
        };
        parsed.ok_or_else(|| {
            self.resync();
            Self::malformed(start, format!("invalid number {text:?}"))
        })
    }

    fn read_keyword(&mut self) -> String {
        let start = self.pos;
        self.resync();
        if self.pos == start {
            // a byte that is neither regular nor handled above
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    /// `BI <dict entries> ID <data> EI`, called after `BI` was read.
    fn read_inline_image(&mut self, start: usize) -> Result<Token, BackendError> {
        let mut operands = OperandStack::new();
        loop {
            let offset = self.pos;
            match self.next_token() {
                None => {
                    return Err(Self::malformed(
                        start,
                        "unterminated inline image (missing ID)",
                    ));
                }
                Some(Ok(Token::Operator(kw))) if kw == "ID" => break,
                Some(Ok(Token::Operator(kw))) if kw == "EI" => {
                    return Err(Self::malformed(start, "inline image without ID"));
                }
                Some(Ok(token)) => operands.push(token, offset)?,
                Some(Err(e)) => return Err(e),
            }
        }
        // one whitespace byte separates ID from the data
        if self.peek_at(0).is_some_and(is_whitespace) {
            self.pos += 1;
        }

        let (entries, _) = operands.take();
        let mut dict = Vec::with_capacity(entries.len() / 2);
        let mut iter = entries.into_iter();
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            if let Operand::Name(key) = key {
                dict.push((key, value));
            }
        }

        let data_start = self.pos;
        let input = self.input;
        let mut i = data_start;
        while i + 2 <= input.len() {
            if input[i] == b'E'
                && input[i + 1] == b'I'
                && (i == data_start || is_whitespace(input[i - 1]))
                && input.get(i + 2).is_none_or(|&b| is_whitespace(b) || is_delimiter(b))
            {
                let mut end = i;
                if end > data_start && is_whitespace(input[end - 1]) {
                    end -= 1;
                }
                self.pos = i + 2;
                return Ok(Token::InlineImage(InlineImage {
                    dict,
                    data: input[data_start..end].to_vec(),
                }));
            }
            i += 1;
        }

        self.pos = input.len();
        Err(Self::malformed(
            start,
            "unterminated inline image (missing EI)",
        ))
    }
}

impl Iterator for ContentStreamLexer<'_> {
    type Item = Result<Token, BackendError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Returns `true` if `b` is a PDF whitespace character.
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

/// Returns `true` if `b` is a PDF delimiter character.
pub(crate) fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

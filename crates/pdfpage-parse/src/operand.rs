//! Operands and the operand stack.
//!
//! Arrays and dictionaries arrive from the lexer as start/end tokens; the
//! [`OperandStack`] assembles them into nested [`Operand`] values and
//! detects containers that are never closed.

use crate::error::BackendError;
use crate::lexer::Token;

/// A PDF content stream operand value.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Integer number (e.g., `42`, `-7`).
    Integer(i64),
    /// Real (floating-point) number (e.g., `3.14`, `.5`).
    Real(f64),
    /// Name object (e.g., `/F1`, `/DeviceRGB`). Stored without the leading `/`.
    Name(String),
    /// Literal string delimited by parentheses, stored as raw bytes.
    LiteralString(Vec<u8>),
    /// Hexadecimal string delimited by angle brackets, stored as decoded bytes.
    HexString(Vec<u8>),
    /// Array of operands (e.g., `[1 2 3]`).
    Array(Vec<Operand>),
    /// Boolean value (`true` or `false`).
    Boolean(bool),
    /// The null object.
    Null,
    /// Dictionary object (`<< /Key value ... >>`).
    Dictionary(Vec<(String, Operand)>),
}

impl Operand {
    /// Numeric value of an integer or real operand.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Operand::Integer(i) => Some(*i as f64),
            Operand::Real(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Bytes of a literal or hex string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Operand::LiteralString(b) | Operand::HexString(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Operand]> {
        match self {
            Operand::Array(items) => Some(items),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Array,
    Dict,
}

#[derive(Debug)]
struct Container {
    kind: ContainerKind,
    offset: usize,
    items: Vec<Operand>,
}

impl Container {
    fn into_operand(self) -> Operand {
        match self.kind {
            ContainerKind::Array => Operand::Array(self.items),
            ContainerKind::Dict => {
                let mut entries = Vec::with_capacity(self.items.len() / 2);
                let mut iter = self.items.into_iter();
                while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
                    if let Operand::Name(key) = key {
                        entries.push((key, value));
                    }
                }
                Operand::Dictionary(entries)
            }
        }
    }
}

/// LIFO of operands waiting for their operator.
#[derive(Debug, Default)]
pub struct OperandStack {
    operands: Vec<Operand>,
    open: Vec<Container>,
}

impl OperandStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of complete top-level operands.
    pub fn len(&self) -> usize {
        self.operands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operands.is_empty() && self.open.is_empty()
    }

    /// Push a value or container token read at byte `offset`.
    ///
    /// Operator and inline-image tokens carry no operand and are ignored.
    /// A closing delimiter with no matching opener is reported as
    /// [`BackendError::MalformedStream`] and otherwise ignored.
    pub fn push(&mut self, token: Token, offset: usize) -> Result<(), BackendError> {
        match token {
            Token::ArrayStart => self.open.push(Container {
                kind: ContainerKind::Array,
                offset,
                items: Vec::new(),
            }),
            Token::DictStart => self.open.push(Container {
                kind: ContainerKind::Dict,
                offset,
                items: Vec::new(),
            }),
            Token::ArrayEnd => return self.close(ContainerKind::Array, offset),
            Token::DictEnd => return self.close(ContainerKind::Dict, offset),
            other => {
                if let Some(operand) = other.into_operand() {
                    self.push_operand(operand);
                }
            }
        }
        Ok(())
    }

    fn push_operand(&mut self, operand: Operand) {
        match self.open.last_mut() {
            Some(container) => container.items.push(operand),
            None => self.operands.push(operand),
        }
    }

    fn close(&mut self, kind: ContainerKind, offset: usize) -> Result<(), BackendError> {
        match self.open.last() {
            Some(container) if container.kind == kind => {
                if let Some(container) = self.open.pop() {
                    self.push_operand(container.into_operand());
                }
                Ok(())
            }
            _ => Err(BackendError::MalformedStream {
                offset,
                reason: match kind {
                    ContainerKind::Array => "unexpected ']'".to_string(),
                    ContainerKind::Dict => "unexpected '>>'".to_string(),
                },
            }),
        }
    }

    /// Take all operands for the operator that just arrived.
    ///
    /// Containers still open are closed as they stand; the returned error
    /// reports the outermost one.
    pub fn take(&mut self) -> (Vec<Operand>, Option<BackendError>) {
        let unterminated = self.open.first().map(|c| BackendError::MalformedStream {
            offset: c.offset,
            reason: match c.kind {
                ContainerKind::Array => "unterminated array".to_string(),
                ContainerKind::Dict => "unterminated dictionary".to_string(),
            },
        });
        while let Some(container) = self.open.pop() {
            self.push_operand(container.into_operand());
        }
        (std::mem::take(&mut self.operands), unterminated)
    }

    pub fn clear(&mut self) {
        self.operands.clear();
        self.open.clear();
    }
}

//! pdfpage-parse: content stream lexer, interpreter and lopdf page loader.
//!
//! This crate turns page content streams into paint events (Layer 2 of
//! pdfpage) and builds [`PageModel`](pdfpage_core::PageModel)s from parsed
//! documents. It depends on pdfpage-core for the shared data types.

pub mod cmap;
pub mod color_space;
pub mod error;
pub mod font;
pub mod graphics_state;
pub mod handler;
pub mod interpreter;
pub mod lexer;
pub mod lopdf_backend;
pub mod operand;
pub mod operator;
pub mod text_renderer;
pub mod text_state;

pub use cmap::parse_to_unicode;
pub use error::BackendError;
pub use font::{AdvanceLookup, DecodedGlyph, FontTableAdvances};
pub use graphics_state::{GraphicsState, GraphicsStateStack};
pub use handler::{
    ContentHandler, GlyphEvent, ImageEvent, InlineImageEvent, PaintOp, PathEvent,
};
pub use interpreter::{ContentStreamInterpreter, interpret_page, interpret_page_with};
pub use lexer::{ContentStreamLexer, InlineImage, Token};
pub use lopdf_backend::{PageIndex, PageLoader, load_document, page_model, page_models};
pub use operand::{Operand, OperandStack};
pub use operator::Op;
pub use text_state::{TextRenderMode, TextState};

pub use lopdf;
pub use pdfpage_core;

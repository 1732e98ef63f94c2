//! pdfpage: page text, attribute runs, per-character layout and image
//! placements from PDF content streams.
//!
//! This is the public API facade crate. It re-exports types from
//! pdfpage-core and uses pdfpage-parse for loading and interpretation.
//!
//! # Architecture
//!
//! - **pdfpage-core**: page model, geometry, text assembly and image types
//! - **pdfpage-parse**: content stream lexer, interpreter and lopdf loader
//! - **pdfpage** (this crate): [`Document`] and [`Page`]

mod collector;
mod document;
mod page;

pub use document::{Document, PagesIter};
pub use page::Page;

pub use pdfpage_core::{
    Color, ColorSpace, Ctm, ExtractOptions, ExtractWarning, ExtractWarningCode, FontDescriptor,
    FormXObject, ImageDecoder, ImageDescriptor, ImageFilter, ImagePlacement, PageModel, PdfError,
    Raster, RawImageDecoder, Rectangle, ResourceTable, TextAttributes, TextEl, UnicodeNorm,
    XObject,
};
pub use pdfpage_parse::{ContentHandler, interpret_page};

pub use pdfpage_core;
pub use pdfpage_parse;

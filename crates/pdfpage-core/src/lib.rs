//! pdfpage-core: Backend-independent page model and text assembly types.
//!
//! This crate provides the resolved page model (`PageModel`, `ResourceTable`,
//! font and image descriptors), geometry and color types, and the
//! accumulators (`TextAssembler`, `ImageCollector`) that turn interpreter
//! events into page text, attribute runs, layout and image placements.

pub mod assembler;
pub mod encoding;
pub mod error;
pub mod geometry;
pub mod images;
pub mod page_model;
pub mod painting;
pub mod path;
pub mod text;
pub mod unicode_norm;

pub use assembler::{AssembledText, GlyphStyle, ImageCollector, TextAssembler};
pub use encoding::{FontEncoding, StandardEncoding, glyph_name_to_char};
pub use error::{ExtractOptions, ExtractWarning, ExtractWarningCode, PdfError};
pub use geometry::{Ctm, Point, Rectangle};
pub use images::{
    ImageDecoder, ImageFilter, ImagePlacement, Raster, RawImageDecoder, image_area_from_ctm,
};
pub use page_model::{
    CodeWidth, FontDescriptor, FontFlags, FontProgram, FormXObject, ImageDescriptor, PageModel,
    ResourceTable, XObject,
};
pub use painting::{Color, ColorSpace, FillRule};
pub use path::{Path, PathBuilder, PathSegment};
pub use text::{TextAttributes, TextEl, merge_text_layout_and_attrs, runs_cover};
pub use unicode_norm::UnicodeNorm;

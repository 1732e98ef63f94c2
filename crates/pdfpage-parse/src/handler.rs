//! Content handler callback trait for content stream interpretation.
//!
//! The interpreter calls [`ContentHandler`] methods in content-stream order
//! as it paints glyphs, images and paths. Text extraction, image collection
//! and rendering backends are all handlers.

use pdfpage_core::{Color, Ctm, ExtractWarning, FillRule, GlyphStyle, Path, Rectangle};

use crate::text_state::TextRenderMode;

/// The type of paint operation applied to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOp {
    /// Path is stroked (outlined).
    Stroke,
    /// Path is filled.
    Fill,
    /// Path is both filled and stroked.
    FillAndStroke,
}

/// A shown glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphEvent {
    /// Character code from the shown string.
    pub code: u32,
    /// Unicode text; one glyph may carry several codepoints.
    pub text: String,
    /// Run formatting: font name, size, underline and paint color.
    pub style: GlyphStyle,
    /// Axis-aligned glyph box in page space.
    pub rect: Rectangle,
    /// Glyph space to page space: `[Tfs·Th 0 0 Tfs 0 Trise] × Tm × CTM`.
    pub rendering_matrix: Ctm,
    /// Horizontal advance in text space, spacing included.
    pub advance: f64,
    pub render_mode: TextRenderMode,
}

/// An image XObject painted by `Do`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEvent {
    /// Image id from the resource table.
    pub id: u32,
    /// Resource name (e.g. "Im0").
    pub name: String,
    /// The unit square through the CTM.
    pub area: Rectangle,
    pub ctm: Ctm,
    pub width: u32,
    pub height: u32,
}

/// An inline image (`BI … ID … EI`).
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImageEvent {
    pub area: Rectangle,
    pub ctm: Ctm,
    /// `/W`, 0 when missing.
    pub width: u32,
    /// `/H`, 0 when missing.
    pub height: u32,
    /// Raw sample bytes between `ID` and `EI`.
    pub data: Vec<u8>,
}

/// A painted path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEvent {
    /// Segments in page space.
    pub path: Path,
    pub paint_op: PaintOp,
    /// Fill rule for filled paths, `None` for stroke-only paths.
    pub fill_rule: Option<FillRule>,
    pub line_width: f64,
    pub stroke_color: Color,
    pub fill_color: Color,
}

/// Callback handler for content stream interpretation.
///
/// All methods have default no-op implementations, allowing handlers to
/// subscribe only to the event types they care about.
pub trait ContentHandler {
    /// Called once per shown glyph.
    fn on_glyph(&mut self, _event: GlyphEvent) {}

    /// Called when an image XObject is placed on the page.
    fn on_image(&mut self, _event: ImageEvent) {}

    /// Called for each inline image.
    fn on_inline_image(&mut self, _event: InlineImageEvent) {}

    /// Called when a path is painted (stroked, filled, or both).
    fn on_path(&mut self, _event: PathEvent) {}

    /// Called when a non-fatal warning is encountered during interpretation.
    ///
    /// The interpreter has already recovered; the warning only reports
    /// what was skipped or substituted.
    fn on_warning(&mut self, _warning: ExtractWarning) {}
}

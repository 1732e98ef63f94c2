//! Text state for the content stream interpreter.
//!
//! Implements the PDF text state model: font selection (Tf), spacing and
//! scaling parameters, the text matrix and line matrix, and the text
//! positioning operators (Td, TD, Tm, T*).

use std::sync::Arc;

use pdfpage_core::{Ctm, FontDescriptor};

/// Text rendering mode values (Tr operator).
///
/// Determines how character glyphs are painted (filled, stroked, clipped, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextRenderMode {
    /// Fill character glyphs (default).
    #[default]
    Fill = 0,
    /// Stroke (outline) character glyphs.
    Stroke = 1,
    /// Fill and stroke character glyphs.
    FillStroke = 2,
    /// Neither fill nor stroke (invisible text).
    Invisible = 3,
    /// Fill and add to clipping path.
    FillClip = 4,
    /// Stroke and add to clipping path.
    StrokeClip = 5,
    /// Fill, stroke, and add to clipping path.
    FillStrokeClip = 6,
    /// Add to clipping path only.
    Clip = 7,
}

impl TextRenderMode {
    /// Create a TextRenderMode from an integer value (0-7).
    /// Returns None for invalid values.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Fill),
            1 => Some(Self::Stroke),
            2 => Some(Self::FillStroke),
            3 => Some(Self::Invisible),
            4 => Some(Self::FillClip),
            5 => Some(Self::StrokeClip),
            6 => Some(Self::FillStrokeClip),
            7 => Some(Self::Clip),
            _ => None,
        }
    }

    /// Whether glyphs are painted with the stroke color only.
    pub fn is_stroke_only(self) -> bool {
        matches!(self, Self::Stroke | Self::StrokeClip)
    }
}

/// Text parameters of the graphics state.
///
/// Saved and restored by `q`/`Q` together with the rest of the graphics
/// state, text matrices included.
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    /// Font selected by `Tf`; `None` until the first `Tf`.
    pub font: Option<Arc<FontDescriptor>>,
    /// Font size set by `Tf`.
    pub font_size: f64,
    /// Character spacing (Tc). Extra space added after each glyph.
    pub char_spacing: f64,
    /// Word spacing (Tw). Extra space added after each single-byte code 32.
    pub word_spacing: f64,
    /// Horizontal scaling (Tz), in percent.
    pub h_scaling: f64,
    /// Text leading (TL).
    pub leading: f64,
    pub render_mode: TextRenderMode,
    /// Text rise (Ts).
    pub rise: f64,
    text_matrix: Ctm,
    line_matrix: Ctm,
}

impl Default for TextState {
    fn default() -> Self {
        Self::new()
    }
}

impl TextState {
    pub fn new() -> Self {
        Self {
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            render_mode: TextRenderMode::default(),
            rise: 0.0,
            text_matrix: Ctm::identity(),
            line_matrix: Ctm::identity(),
        }
    }

    pub fn text_matrix(&self) -> &Ctm {
        &self.text_matrix
    }

    pub fn line_matrix(&self) -> &Ctm {
        &self.line_matrix
    }

    /// Horizontal scaling as a fraction (1.0 = 100%).
    pub fn h_scaling_normalized(&self) -> f64 {
        self.h_scaling / 100.0
    }

    /// Text rendering matrix before the CTM:
    /// `[Tfs·Th 0 0 Tfs 0 Trise] × Tm`.
    pub fn rendering_matrix(&self) -> Ctm {
        let params = Ctm::new(
            self.font_size * self.h_scaling_normalized(),
            0.0,
            0.0,
            self.font_size,
            0.0,
            self.rise,
        );
        params.concat(&self.text_matrix)
    }

    // --- BT operator ---

    /// `BT`: reset the text matrix and line matrix to identity.
    pub fn begin_text(&mut self) {
        self.text_matrix = Ctm::identity();
        self.line_matrix = Ctm::identity();
    }

    // --- Tf operator ---

    pub fn set_font(&mut self, font: Arc<FontDescriptor>, font_size: f64) {
        self.font = Some(font);
        self.font_size = font_size;
    }

    // --- Tm operator ---

    /// `Tm`: set the text matrix and line matrix. Replaces, does not concatenate.
    pub fn set_text_matrix(&mut self, m: Ctm) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    // --- Td operator ---

    /// `Td`: move to the start of the next line, offset from the start of the
    /// current line by `(tx, ty)`.
    pub fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Ctm::translation(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    // --- TD operator ---

    /// `TD`: `-ty TL` followed by `tx ty Td`.
    pub fn move_text_position_and_set_leading(&mut self, tx: f64, ty: f64) {
        self.leading = -ty;
        self.move_text_position(tx, ty);
    }

    // --- T* operator ---

    /// `T*`: `0 -TL Td`.
    pub fn move_to_next_line(&mut self) {
        let leading = self.leading;
        self.move_text_position(0.0, -leading);
    }

    // --- Glyph advancement ---

    /// Translate the text matrix by `tx` text space units along the baseline.
    pub fn advance_text_position(&mut self, tx: f64) {
        self.text_matrix = Ctm::translation(tx, 0.0).concat(&self.text_matrix);
    }
}
